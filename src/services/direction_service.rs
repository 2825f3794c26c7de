//! Direction Service
//!
//! Bullish / bearish classification of the opening candle.

use crate::error::Result;
use crate::services::zone_service::Selection;
use crate::state::AppState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayType {
    Bullish,
    Bearish,
    Neutral,
}

impl DayType {
    pub fn of(open: f64, close: f64) -> Self {
        if close > open {
            DayType::Bullish
        } else if close < open {
            DayType::Bearish
        } else {
            DayType::Neutral
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayType::Bullish => write!(f, "Bullish"),
            DayType::Bearish => write!(f, "Bearish"),
            DayType::Neutral => write!(f, "Neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayTypeCount {
    pub day_type: DayType,
    pub count: i64,
    /// 0 - 100
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyDirection {
    pub day: NaiveDate,
    pub day_type: DayType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionStats {
    /// Ordered by count, highest first
    pub summary: Vec<DayTypeCount>,
    /// Ordered by day
    pub daily: Vec<DailyDirection>,
}

impl DirectionStats {
    pub fn percentage_of(&self, day_type: DayType) -> Option<f64> {
        self.summary
            .iter()
            .find(|c| c.day_type == day_type)
            .map(|c| c.percentage)
    }
}

/// Direction service for business logic
pub struct DirectionService;

impl DirectionService {
    pub fn compute(state: &AppState, selection: &Selection) -> Result<DirectionStats> {
        let candles = state.duckdb.opening_candles(
            &selection.day_list(),
            &selection.filter,
            selection.hours.open,
        )?;

        let daily: Vec<DailyDirection> = candles
            .iter()
            .map(|c| DailyDirection {
                day: c.day,
                day_type: DayType::of(c.open, c.close),
            })
            .collect();

        info!(
            "DirectionService::compute - {} opening candles at {}",
            daily.len(),
            selection.hours.open
        );

        Ok(DirectionStats {
            summary: summarize(&daily),
            daily,
        })
    }
}

/// Count each day type; types that never occur are left out
pub fn summarize(daily: &[DailyDirection]) -> Vec<DayTypeCount> {
    let total = daily.len() as i64;
    let mut summary: Vec<DayTypeCount> = [DayType::Bullish, DayType::Bearish, DayType::Neutral]
        .into_iter()
        .map(|day_type| {
            let count = daily.iter().filter(|d| d.day_type == day_type).count() as i64;
            DayTypeCount {
                day_type,
                count,
                percentage: if total > 0 {
                    count as f64 * 100.0 / total as f64
                } else {
                    0.0
                },
            }
        })
        .filter(|c| c.count > 0)
        .collect();

    // Stable, so ties keep Bullish / Bearish / Neutral order
    summary.sort_by(|a, b| b.count.cmp(&a.count));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::duckdb::tests::{d, seed};
    use crate::services::zone_service::{ClassifyRequest, ZoneService};

    fn daily(types: &[DayType]) -> Vec<DailyDirection> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| DailyDirection {
                day: d(i as u32 + 1),
                day_type: *t,
            })
            .collect()
    }

    #[test]
    fn test_day_type() {
        assert_eq!(DayType::of(1.0, 1.1), DayType::Bullish);
        assert_eq!(DayType::of(1.1, 1.0), DayType::Bearish);
        assert_eq!(DayType::of(1.0, 1.0), DayType::Neutral);
    }

    #[test]
    fn test_summary_ordered_by_count() {
        let summary = summarize(&daily(&[
            DayType::Bearish,
            DayType::Bullish,
            DayType::Bearish,
            DayType::Bearish,
        ]));
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].day_type, DayType::Bearish);
        assert_eq!(summary[0].percentage, 75.0);
        assert_eq!(summary[1].day_type, DayType::Bullish);
        assert_eq!(summary[1].count, 1);
    }

    #[test]
    fn test_empty_summary() {
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn test_compute_from_opening_candles() {
        let state = AppState::in_memory().unwrap();
        seed(&state.duckdb);
        let selection = ZoneService::select(&state, &ClassifyRequest::default()).unwrap();

        let stats = DirectionService::compute(&state, &selection).unwrap();

        // 09:30 candles: day 2 up, day 3 down, ES on day 4 down
        assert_eq!(stats.daily.len(), 3);
        assert_eq!(stats.daily[0].day_type, DayType::Bullish);
        assert_eq!(stats.daily[1].day_type, DayType::Bearish);
        assert_eq!(stats.daily[2].day_type, DayType::Bearish);
        assert_eq!(stats.summary[0].day_type, DayType::Bearish);
        assert_eq!(stats.summary[0].count, 2);
        assert_eq!(stats.percentage_of(DayType::Neutral), None);
    }
}
