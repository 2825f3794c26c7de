//! Day Stats Service
//!
//! High/low of day: how often it is printed in the opening hour, and when
//! in the day it is first printed.

use crate::analysis::buckets::{count_buckets, day_bucket, day_bucket_labels, fill_day_buckets};
use crate::analysis::BucketCount;
use crate::db::duckdb::models::DayExtreme;
use crate::error::Result;
use crate::services::zone_service::Selection;
use crate::state::AppState;
use serde::Serialize;
use tracing::info;

/// Share of the selected days whose extreme was printed in the opening hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpenProbability {
    pub count: i64,
    pub total_days: i64,
    /// 0.0 - 1.0
    pub probability: f64,
}

impl OpenProbability {
    pub fn new(count: i64, total_days: i64) -> Self {
        let probability = if total_days > 0 {
            count as f64 / total_days as f64
        } else {
            0.0
        };
        Self {
            count,
            total_days,
            probability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStats {
    pub high_in_open: OpenProbability,
    pub low_in_open: OpenProbability,
    /// All 48 half-hour buckets, zero-filled
    pub high_distribution: Vec<BucketCount>,
    pub low_distribution: Vec<BucketCount>,
    pub labels: Vec<String>,
}

/// Day stats service for business logic
pub struct DayStatsService;

impl DayStatsService {
    pub fn compute(state: &AppState, selection: &Selection) -> Result<DayStats> {
        let days = selection.day_list();
        let total = days.len() as i64;

        let in_open = |extreme| {
            state
                .duckdb
                .extreme_in_open_count(&days, &selection.filter, extreme, &selection.hours)
                .map(|count| OpenProbability::new(count, total))
        };
        let high_in_open = in_open(DayExtreme::High)?;
        let low_in_open = in_open(DayExtreme::Low)?;

        let distribution = |extreme| -> Result<Vec<BucketCount>> {
            let times = state
                .duckdb
                .first_extreme_times(&days, &selection.filter, extreme)?;
            let counts = count_buckets(times.iter().map(|(_, ts)| day_bucket(ts.time())));
            Ok(fill_day_buckets(&counts))
        };
        let high_distribution = distribution(DayExtreme::High)?;
        let low_distribution = distribution(DayExtreme::Low)?;

        info!(
            "DayStatsService::compute - {} days, high in open {}, low in open {}",
            total, high_in_open.count, low_in_open.count
        );

        Ok(DayStats {
            high_in_open,
            low_in_open,
            high_distribution,
            low_distribution,
            labels: day_bucket_labels(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::duckdb::tests::{d, seed};
    use crate::services::zone_service::{ClassifyRequest, DayFilter, ZoneService};

    #[test]
    fn test_probability_with_no_days() {
        let p = OpenProbability::new(0, 0);
        assert_eq!(p.probability, 0.0);
        assert_eq!(OpenProbability::new(1, 4).probability, 0.25);
    }

    #[test]
    fn test_compute() {
        let state = AppState::in_memory().unwrap();
        seed(&state.duckdb);
        let request = ClassifyRequest {
            filter: DayFilter {
                start_date: Some(d(2)),
                end_date: Some(d(3)),
                category_filter: "6E".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let selection = ZoneService::select(&state, &request).unwrap();
        let stats = DayStatsService::compute(&state, &selection).unwrap();

        assert_eq!(stats.high_in_open.count, 1);
        assert_eq!(stats.high_in_open.probability, 0.5);
        assert_eq!(stats.low_in_open.count, 0);

        assert_eq!(stats.high_distribution.len(), 48);
        assert_eq!(stats.labels.len(), 48);
        // Highs at 09:00 (bucket 18) and 12:00 (bucket 24)
        assert_eq!(stats.high_distribution[18].count, 1);
        assert_eq!(stats.high_distribution[24].count, 1);
        let total: i64 = stats.high_distribution.iter().map(|b| b.count).sum();
        assert_eq!(total, 2);
        // Day 3 low at 00:00
        assert_eq!(stats.low_distribution[0].count, 1);
    }
}
