//! Retracement Service
//!
//! Buckets how long price took to come back to a reference level on the
//! selected days: the midnight open, or the Zone 1 opening price once Zone 3
//! has formed.

use crate::analysis::buckets::{
    count_buckets, elapsed_bucket, elapsed_bucket_labels, session_bucket, session_bucket_labels,
};
use crate::analysis::zones::ZoneStart;
use crate::analysis::{BucketCount, NO_RETRACEMENT};
use crate::error::{AppError, Result};
use crate::services::zone_service::Selection;
use crate::state::AppState;
use chrono::NaiveTime;
use serde::Serialize;
use tracing::info;

/// Bucketed first-retracement times
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetracementStats {
    /// `(bucket, count)` ordered by bucket; `-1` holds the days that never retraced
    pub buckets: Vec<BucketCount>,
    pub labels: Vec<String>,
    pub total_days: i64,
    pub retraced: i64,
    pub not_retraced: i64,
    pub retraced_pct: f64,
    pub not_retraced_pct: f64,
}

impl RetracementStats {
    fn from_buckets(buckets: Vec<BucketCount>, labels: Vec<String>) -> Self {
        let retraced: i64 = buckets
            .iter()
            .filter(|b| b.bucket >= 0)
            .map(|b| b.count)
            .sum();
        let not_retraced: i64 = buckets
            .iter()
            .filter(|b| b.bucket == NO_RETRACEMENT)
            .map(|b| b.count)
            .sum();
        let total_days = retraced + not_retraced;
        let pct = |count: i64| {
            if total_days > 0 {
                count as f64 * 100.0 / total_days as f64
            } else {
                0.0
            }
        };

        Self {
            labels,
            total_days,
            retraced,
            not_retraced,
            retraced_pct: pct(retraced),
            not_retraced_pct: pct(not_retraced),
            buckets,
        }
    }
}

/// Retracement service for business logic
pub struct RetracementService;

impl RetracementService {
    /// When the midnight open was first revisited during the retracement window
    pub fn midnight_open(state: &AppState, selection: &Selection) -> Result<RetracementStats> {
        let hours = &selection.hours;
        let rows = state
            .duckdb
            .midnight_retracements(&selection.day_list(), &selection.filter, hours)?;

        info!(
            "RetracementService::midnight_open - {} days with a midnight bar",
            rows.len()
        );

        let buckets = count_buckets(rows.iter().map(|row| {
            row.first_retracement
                .map(|ts| session_bucket(ts.time(), hours.retracement_start_hour))
                .unwrap_or(NO_RETRACEMENT)
        }));

        Ok(RetracementStats::from_buckets(
            buckets,
            session_bucket_labels(hours.retracement_start_hour, hours.close_hour),
        ))
    }

    /// When the Zone 1 opening price was first revisited after Zone 3 formed
    pub fn zone1(state: &AppState, selection: &Selection) -> Result<RetracementStats> {
        let hours = &selection.hours;
        let zone1 = selection.zones.zone1.start;
        let zone3 = selection.zones.zone3.start;
        formation_end(zone1, hours.formation_minutes)?;
        let formed = formation_end(zone3, hours.formation_minutes)?;

        let rows = state.duckdb.zone1_retracements(
            &selection.day_list(),
            &selection.filter,
            zone1,
            zone3,
            hours,
        )?;

        info!(
            "RetracementService::zone1 - {} days with Zone 3 formed",
            rows.len()
        );

        let buckets = count_buckets(rows.iter().map(|row| {
            row.first_retracement
                .map(|ts| elapsed_bucket(row.zone3_formed, ts))
                .unwrap_or(NO_RETRACEMENT)
        }));

        Ok(RetracementStats::from_buckets(
            buckets,
            elapsed_bucket_labels(formed, hours.close_hour),
        ))
    }
}

/// End of a formation window; the window may not cross midnight
fn formation_end(start: ZoneStart, formation_minutes: u32) -> Result<NaiveTime> {
    let end = start.minute_of_day() + formation_minutes;
    if end >= 24 * 60 {
        return Err(AppError::Validation(format!(
            "Formation window starting at {} must end before midnight",
            start
        )));
    }
    NaiveTime::from_hms_opt(end / 60, end % 60, 0)
        .ok_or_else(|| AppError::Internal(format!("Invalid formation end {}", end)))
}
