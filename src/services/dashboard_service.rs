//! Dashboard Service
//!
//! Runs the full pipeline for one set of filters:
//!
//! 1. zone classification
//! 2. midnight-open and Zone 1 retracements
//! 3. high/low of day statistics
//! 4. bullish/bearish opening candles
//! 5. summary cards
//!
//! A failing stage is reported as `Error in <stage>: <cause>`. When no day
//! matches, the statistics are left out and only the cards are built.

use crate::analysis::zones::{ZoneConditions, ZoneLayout, ZoneWindow};
use crate::cache::QueryCache;
use crate::error::{AppError, Result};
use crate::services::day_stats_service::{DayStats, DayStatsService};
use crate::services::direction_service::{DayType, DirectionService, DirectionStats};
use crate::services::retracement_service::{RetracementService, RetracementStats};
use crate::services::zone_service::{ClassifiedDay, ClassifyRequest, Selection, ZoneService};
use crate::state::AppState;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub midnight_retracement: RetracementStats,
    pub zone1_retracement: RetracementStats,
    pub day_stats: DayStats,
    pub direction: DirectionStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeCard {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneCard {
    pub zone: String,
    /// `HH:MM - HH:MM`
    pub time: String,
    pub condition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyStats {
    /// 0.0 - 1.0
    pub high_in_open: f64,
    /// 0.0 - 1.0
    pub low_in_open: f64,
    /// 0 - 100, absent when no day was bullish
    pub bullish_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCards {
    pub days_analyzed: usize,
    pub date_range: Option<DateRangeCard>,
    /// Comma separated, or "All"
    pub symbols: String,
    pub categories: String,
    pub zones: Vec<ZoneCard>,
    pub key_stats: Option<KeyStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResult {
    pub days: Vec<ClassifiedDay>,
    pub stats: Option<DashboardStats>,
    pub cards: SummaryCards,
}

/// Dashboard service for business logic
pub struct DashboardService;

impl DashboardService {
    /// Run the pipeline, serving repeated requests from the cache
    pub fn run(state: &AppState, request: &ClassifyRequest) -> Result<Arc<DashboardResult>> {
        let ttl = state.settings()?.cache_ttl();
        let key = QueryCache::key("dashboard", request);
        state
            .cache
            .get_or_try_insert(key, ttl, || Self::compute(state, request).map(Arc::new))
    }

    pub fn compute(state: &AppState, request: &ClassifyRequest) -> Result<DashboardResult> {
        let selection =
            ZoneService::select(state, request).map_err(|e| e.in_stage("zone classification"))?;

        let stats = if selection.days.is_empty() {
            info!("DashboardService::compute - no matching days, skipping statistics");
            None
        } else {
            Some(Self::stats(state, &selection)?)
        };

        let cards = build_cards(&selection, stats.as_ref());

        Ok(DashboardResult {
            days: selection.days,
            stats,
            cards,
        })
    }

    fn stats(state: &AppState, selection: &Selection) -> Result<DashboardStats> {
        let stage = |name: &'static str| move |e: AppError| e.in_stage(name);

        let midnight_retracement =
            RetracementService::midnight_open(state, selection).map_err(stage("retracement analysis"))?;
        let zone1_retracement =
            RetracementService::zone1(state, selection).map_err(stage("zone 1 retracement analysis"))?;
        let day_stats =
            DayStatsService::compute(state, selection).map_err(stage("high/low of day analysis"))?;
        let direction =
            DirectionService::compute(state, selection).map_err(stage("bullish/bearish analysis"))?;

        Ok(DashboardStats {
            midnight_retracement,
            zone1_retracement,
            day_stats,
            direction,
        })
    }
}

fn all_or_joined(values: &[String]) -> String {
    if values.is_empty() {
        "All".to_string()
    } else {
        values.join(", ")
    }
}

fn zone_cards(zones: &ZoneLayout, conditions: &ZoneConditions) -> Vec<ZoneCard> {
    let windows: [&ZoneWindow; 3] = [&zones.zone1, &zones.zone2, &zones.zone3];
    windows
        .iter()
        .zip(conditions.describe())
        .enumerate()
        .map(|(i, (window, condition))| ZoneCard {
            zone: format!("Zone {}", i + 1),
            time: window.label(),
            condition,
        })
        .collect()
}

pub fn build_cards(selection: &Selection, stats: Option<&DashboardStats>) -> SummaryCards {
    let date_range = selection.range.map(|(start, end)| DateRangeCard {
        start,
        end,
        total_days: (end - start).num_days() + 1,
    });

    let key_stats = stats.map(|s| KeyStats {
        high_in_open: s.day_stats.high_in_open.probability,
        low_in_open: s.day_stats.low_in_open.probability,
        bullish_pct: s.direction.percentage_of(DayType::Bullish),
    });

    SummaryCards {
        days_analyzed: selection.days.len(),
        date_range,
        symbols: all_or_joined(&selection.filter.symbols),
        categories: all_or_joined(&selection.filter.categories),
        zones: zone_cards(&selection.zones, &selection.conditions),
        key_stats,
    }
}
