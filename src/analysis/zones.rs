//! Zone windows and day classification
//!
//! A zone is a clock-time window inside a trading day (60 minutes by default).
//! A day is classified by comparing the highest price printed inside each of
//! the three zones:
//! - Zone 1 is compared with Zone 2
//! - Zone 2 is compared with Zone 1
//! - Zone 3 is compared with both Zone 1 and Zone 2

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const DEFAULT_ZONE_MINUTES: u32 = 60;
pub const DEFAULT_STACKED_TOLERANCE: f64 = 0.1;

/// Clock time a zone (or session) starts at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneStart {
    pub hour: u32,
    pub minute: u32,
}

impl ZoneStart {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        let start = Self { hour, minute };
        start.validate()?;
        Ok(start)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hour > 23 {
            return Err(AppError::Validation(format!(
                "start hour must be within 0-23, got {}",
                self.hour
            )));
        }
        if self.minute > 59 {
            return Err(AppError::Validation(format!(
                "start minute must be within 0-59, got {}",
                self.minute
            )));
        }
        Ok(())
    }

    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn from_minute_of_day(minutes: u32) -> Self {
        let minutes = minutes % MINUTES_PER_DAY;
        Self {
            hour: minutes / 60,
            minute: minutes % 60,
        }
    }
}

impl fmt::Display for ZoneStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A zone: start time plus duration, inclusive at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneWindow {
    pub start: ZoneStart,
    #[serde(default = "default_zone_minutes")]
    pub duration_minutes: u32,
}

fn default_zone_minutes() -> u32 {
    DEFAULT_ZONE_MINUTES
}

impl ZoneWindow {
    pub fn new(start: ZoneStart, duration_minutes: u32) -> Result<Self> {
        let window = Self {
            start,
            duration_minutes,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        self.start.validate()?;
        if self.duration_minutes == 0 || self.duration_minutes >= MINUTES_PER_DAY {
            return Err(AppError::Validation(format!(
                "zone duration must be between 1 and {} minutes, got {}",
                MINUTES_PER_DAY - 1,
                self.duration_minutes
            )));
        }
        Ok(())
    }

    /// End clock time, wrapped onto the 24h clock
    pub fn end(&self) -> ZoneStart {
        ZoneStart::from_minute_of_day(self.start.minute_of_day() + self.duration_minutes)
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end().minute_of_day() < self.start.minute_of_day()
    }

    /// Whether a bar stamped at `hour:minute` falls inside the zone
    pub fn contains(&self, hour: u32, minute: u32) -> bool {
        let t = hour * 60 + minute;
        let start = self.start.minute_of_day();
        let end = self.end().minute_of_day();
        if self.crosses_midnight() {
            t >= start || t <= end
        } else {
            t >= start && t <= end
        }
    }

    /// SQL predicate over a minute-of-day expression such as `(hour * 60 + minute)`.
    ///
    /// Only validated integers are interpolated.
    pub fn sql_predicate(&self, minute_expr: &str) -> String {
        let start = self.start.minute_of_day();
        let end = self.end().minute_of_day();
        if self.crosses_midnight() {
            format!("({minute_expr} >= {start} OR {minute_expr} <= {end})")
        } else {
            format!("({minute_expr} BETWEEN {start} AND {end})")
        }
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.start, self.end())
    }
}

/// The three zones of a trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLayout {
    pub zone1: ZoneWindow,
    pub zone2: ZoneWindow,
    pub zone3: ZoneWindow,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            zone1: ZoneWindow {
                start: ZoneStart { hour: 18, minute: 0 },
                duration_minutes: DEFAULT_ZONE_MINUTES,
            },
            zone2: ZoneWindow {
                start: ZoneStart { hour: 3, minute: 0 },
                duration_minutes: DEFAULT_ZONE_MINUTES,
            },
            zone3: ZoneWindow {
                start: ZoneStart { hour: 9, minute: 30 },
                duration_minutes: DEFAULT_ZONE_MINUTES,
            },
        }
    }
}

impl ZoneLayout {
    pub fn validate(&self) -> Result<()> {
        self.zone1.validate()?;
        self.zone2.validate()?;
        self.zone3.validate()
    }
}

/// Relationship a zone's high must have with the zone(s) it is compared to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneCondition {
    Above,
    Below,
    Stacked,
}

impl ZoneCondition {
    fn verb(&self) -> &'static str {
        match self {
            ZoneCondition::Above => "above",
            ZoneCondition::Below => "below",
            ZoneCondition::Stacked => "stacked with",
        }
    }
}

/// Selected condition per zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConditions {
    pub zone1: ZoneCondition,
    pub zone2: ZoneCondition,
    pub zone3: ZoneCondition,
}

impl Default for ZoneConditions {
    fn default() -> Self {
        Self {
            zone1: ZoneCondition::Above,
            zone2: ZoneCondition::Above,
            zone3: ZoneCondition::Above,
        }
    }
}

impl ZoneConditions {
    /// Human-readable option text per zone, e.g. "Below Zone 1 & Zone 2"
    pub fn describe(&self) -> [String; 3] {
        fn title(condition: ZoneCondition) -> &'static str {
            match condition {
                ZoneCondition::Above => "Above",
                ZoneCondition::Below => "Below",
                ZoneCondition::Stacked => "Stacked with",
            }
        }
        [
            format!("{} Zone 2", title(self.zone1)),
            format!("{} Zone 1", title(self.zone2)),
            format!("{} Zone 1 & Zone 2", title(self.zone3)),
        ]
    }
}

/// Highest high printed inside each zone on one day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneHighs {
    pub zone1: Option<f64>,
    pub zone2: Option<f64>,
    pub zone3: Option<f64>,
}

/// The first satisfied zone condition of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneRelationship {
    Zone1(ZoneCondition),
    Zone2(ZoneCondition),
    Zone3(ZoneCondition),
}

impl fmt::Display for ZoneRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneRelationship::Zone1(c) => write!(f, "Zone 1 {} Zone 2", c.verb()),
            ZoneRelationship::Zone2(c) => write!(f, "Zone 2 {} Zone 1", c.verb()),
            ZoneRelationship::Zone3(c) => write!(f, "Zone 3 {} Zone 1 & Zone 2", c.verb()),
        }
    }
}

impl Serialize for ZoneRelationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check one zone's high against its comparison highs.
///
/// A missing comparison high never blocks Above/Below, but Stacked needs
/// every high to be present.
fn condition_holds(
    condition: ZoneCondition,
    high: Option<f64>,
    others: &[Option<f64>],
    tolerance: f64,
) -> bool {
    let Some(high) = high else {
        return false;
    };
    match condition {
        ZoneCondition::Above => others.iter().all(|o| o.map_or(true, |o| high > o)),
        ZoneCondition::Below => others.iter().all(|o| o.map_or(true, |o| high < o)),
        ZoneCondition::Stacked => others
            .iter()
            .all(|o| o.map_or(false, |o| (high - o).abs() < tolerance)),
    }
}

/// Classify a day; zones are checked in order and the first match wins.
pub fn classify(
    highs: &ZoneHighs,
    conditions: &ZoneConditions,
    tolerance: f64,
) -> Option<ZoneRelationship> {
    if condition_holds(conditions.zone1, highs.zone1, &[highs.zone2], tolerance) {
        return Some(ZoneRelationship::Zone1(conditions.zone1));
    }
    if condition_holds(conditions.zone2, highs.zone2, &[highs.zone1], tolerance) {
        return Some(ZoneRelationship::Zone2(conditions.zone2));
    }
    if condition_holds(
        conditions.zone3,
        highs.zone3,
        &[highs.zone1, highs.zone2],
        tolerance,
    ) {
        return Some(ZoneRelationship::Zone3(conditions.zone3));
    }
    None
}
