//! Market session windows (Asia / London / New York)
//!
//! Keeps only the bars printed in the first N minutes after each session
//! opens. Opening hours are exchange-local (US/Eastern by default).

use crate::db::duckdb::models::OhlcvRow;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::zones::{ZoneStart, MINUTES_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    Asia,
    London,
    #[serde(rename = "New York")]
    NewYork,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Asia => write!(f, "Asia"),
            Session::London => write!(f, "London"),
            Session::NewYork => write!(f, "New York"),
        }
    }
}

/// Opening hour of each session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHours {
    pub asia: u32,
    pub london: u32,
    pub new_york: u32,
}

impl Default for SessionHours {
    fn default() -> Self {
        // 09:00 JST, 08:00 GMT and 09:30 EST expressed in EST
        Self {
            asia: 19,
            london: 3,
            new_york: 9,
        }
    }
}

/// How many minutes after the open to keep, per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMinutes {
    pub asia: u32,
    pub london: u32,
    pub new_york: u32,
}

impl Default for SessionMinutes {
    fn default() -> Self {
        Self {
            asia: 30,
            london: 30,
            new_york: 30,
        }
    }
}

/// `[start, start + minutes)` on the 24h clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionWindow {
    pub session: Session,
    pub start: ZoneStart,
    pub minutes: u32,
}

impl SessionWindow {
    pub fn new(session: Session, start: ZoneStart, minutes: u32) -> Result<Self> {
        start.validate()?;
        if minutes == 0 || minutes >= MINUTES_PER_DAY {
            return Err(AppError::Validation(format!(
                "{} window must be between 1 and {} minutes, got {}",
                session,
                MINUTES_PER_DAY - 1,
                minutes
            )));
        }
        Ok(Self {
            session,
            start,
            minutes,
        })
    }

    /// Build the three windows; New York opens on the half hour when it opens at 9.
    pub fn standard(hours: &SessionHours, minutes: &SessionMinutes) -> Result<Vec<Self>> {
        let ny_minute = if hours.new_york == 9 { 30 } else { 0 };
        Ok(vec![
            Self::new(Session::Asia, ZoneStart::new(hours.asia, 0)?, minutes.asia)?,
            Self::new(Session::London, ZoneStart::new(hours.london, 0)?, minutes.london)?,
            Self::new(
                Session::NewYork,
                ZoneStart::new(hours.new_york, ny_minute)?,
                minutes.new_york,
            )?,
        ])
    }

    pub fn end(&self) -> ZoneStart {
        ZoneStart::from_minute_of_day(self.start.minute_of_day() + self.minutes)
    }

    /// A window that wraps past midnight keeps only the opening hour before
    /// midnight, plus everything before its end.
    pub fn contains(&self, hour: u32, minute: u32) -> bool {
        let t = hour * 60 + minute;
        let start = self.start.minute_of_day();
        let end = self.end().minute_of_day();
        if end <= start {
            (hour == self.start.hour && minute >= self.start.minute) || t < end
        } else {
            t >= start && t < end
        }
    }
}

/// A bar tagged with the session window it fell in
#[derive(Debug, Clone, Serialize)]
pub struct TaggedBar {
    #[serde(flatten)]
    pub bar: OhlcvRow,
    pub session: Session,
}

/// Keep bars inside any session window, sorted by timestamp.
///
/// Overlapping windows tag the same bar once per window.
pub fn filter_sessions(bars: &[OhlcvRow], windows: &[SessionWindow]) -> Vec<TaggedBar> {
    let mut tagged: Vec<TaggedBar> = windows
        .iter()
        .flat_map(|window| {
            bars.iter()
                .filter(move |bar| window.contains(bar.hour, bar.minute))
                .map(move |bar| TaggedBar {
                    bar: bar.clone(),
                    session: window.session,
                })
        })
        .collect();
    tagged.sort_by_key(|t| t.bar.ts_event);
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, h: u32, m: u32) -> OhlcvRow {
        OhlcvRow::new(
            NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            "6EM4",
            Some("6E"),
            1.08,
            1.09,
            1.07,
            1.085,
            10,
        )
    }

    #[test]
    fn test_standard_windows() {
        let windows =
            SessionWindow::standard(&SessionHours::default(), &SessionMinutes::default()).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].start, ZoneStart { hour: 9, minute: 30 });
        assert_eq!(windows[2].end(), ZoneStart { hour: 10, minute: 0 });
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let w = SessionWindow::new(Session::NewYork, ZoneStart { hour: 9, minute: 30 }, 20).unwrap();
        assert!(w.contains(9, 30));
        assert!(w.contains(9, 49));
        assert!(!w.contains(9, 50));
        assert!(!w.contains(9, 0));
    }

    #[test]
    fn test_window_crossing_midnight() {
        let w = SessionWindow::new(Session::Asia, ZoneStart { hour: 23, minute: 0 }, 90).unwrap();
        assert!(w.contains(23, 15));
        assert!(w.contains(0, 29));
        assert!(!w.contains(0, 30));
        assert!(!w.contains(22, 59));

    }

    #[test]
    fn test_long_wrapping_window_keeps_only_the_opening_hour() {
        let w = SessionWindow::new(Session::Asia, ZoneStart { hour: 19, minute: 0 }, 300).unwrap();
        assert!(w.contains(19, 0));
        assert!(w.contains(19, 59));
        assert!(!w.contains(20, 0));
        assert!(!w.contains(21, 0));
        assert!(!w.contains(23, 59));
        assert!(!w.contains(0, 0));

        let w = SessionWindow::new(Session::Asia, ZoneStart { hour: 19, minute: 15 }, 420).unwrap();
        assert!(!w.contains(19, 14));
        assert!(w.contains(19, 15));
        assert!(!w.contains(22, 0));
        assert!(w.contains(2, 14));
        assert!(!w.contains(2, 15));
    }

    #[test]
    fn test_filter_sessions_tags_and_sorts() {
        let bars = vec![
            bar(6, 3, 10),
            bar(6, 9, 31),
            bar(6, 12, 0),
            bar(6, 19, 5),
            bar(6, 3, 45),
        ];
        let windows =
            SessionWindow::standard(&SessionHours::default(), &SessionMinutes::default()).unwrap();
        let tagged = filter_sessions(&bars, &windows);

        let sessions: Vec<Session> = tagged.iter().map(|t| t.session).collect();
        assert_eq!(
            sessions,
            vec![Session::London, Session::NewYork, Session::Asia]
        );
        assert!(tagged.windows(2).all(|w| w[0].bar.ts_event <= w[1].bar.ts_event));
    }

    #[test]
    fn test_zero_minutes_rejected() {
        assert!(SessionWindow::new(Session::London, ZoneStart { hour: 3, minute: 0 }, 0).is_err());
    }
}
