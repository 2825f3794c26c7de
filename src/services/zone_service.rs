//! Zone Service
//!
//! Resolves the requested day range and filters, pulls per-day zone highs
//! from DuckDB and keeps the days that satisfy the selected zone conditions.
//! Every statistic downstream works off the resulting [`Selection`].

use crate::analysis::zones::{classify, ZoneConditions, ZoneHighs, ZoneLayout, ZoneRelationship};
use crate::analysis::MarketHours;
use crate::db::duckdb::models::DayZoneHighs;
use crate::db::duckdb::MarketFilter;
use crate::error::{AppError, Result};
use crate::state::AppState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Date range plus comma separated symbol / category filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub symbol_filter: String,
    #[serde(default)]
    pub category_filter: String,
}

impl DayFilter {
    pub fn market_filter(&self) -> MarketFilter {
        MarketFilter::parse(&self.symbol_filter, &self.category_filter)
    }
}

/// Request shared by the classification, statistics and dashboard endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    #[serde(flatten)]
    pub filter: DayFilter,
    /// Falls back to the stored zone starts
    #[serde(default)]
    pub zones: Option<ZoneLayout>,
    #[serde(default)]
    pub conditions: ZoneConditions,
    /// Falls back to the stored stacked tolerance
    #[serde(default)]
    pub tolerance: Option<f64>,
}

/// A day that satisfied one of the zone conditions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedDay {
    pub day: NaiveDate,
    pub symbols: String,
    pub zone1_max: Option<f64>,
    pub zone2_max: Option<f64>,
    pub zone3_max: Option<f64>,
    pub relationship: ZoneRelationship,
}

/// Classified days together with everything needed to compute their stats
#[derive(Debug, Clone)]
pub struct Selection {
    pub days: Vec<ClassifiedDay>,
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub filter: MarketFilter,
    pub zones: ZoneLayout,
    pub conditions: ZoneConditions,
    pub hours: MarketHours,
}

impl Selection {
    pub fn day_list(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.day).collect()
    }
}

/// Zone service for business logic
pub struct ZoneService;

impl ZoneService {
    /// Fill missing bounds from the data and check their order.
    ///
    /// Returns `None` when a bound is missing and the table is empty.
    pub fn resolve_range(
        state: &AppState,
        filter: &DayFilter,
    ) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let (start, end) = match (filter.start_date, filter.end_date) {
            (Some(start), Some(end)) => (start, end),
            (start, end) => match state.duckdb.date_range()? {
                Some((min, max)) => (start.unwrap_or(min), end.unwrap_or(max)),
                None => return Ok(None),
            },
        };

        if start > end {
            return Err(AppError::Validation(
                "Start date must be before or equal to the end date".to_string(),
            ));
        }

        Ok(Some((start, end)))
    }

    /// Classify every day in range and keep the matching ones, ordered by day
    pub fn select(state: &AppState, request: &ClassifyRequest) -> Result<Selection> {
        let settings = state.settings()?;
        let zones = request.zones.unwrap_or_else(|| settings.zone_layout());
        zones.validate()?;
        let hours = settings.market_hours();
        let tolerance = request.tolerance.unwrap_or(settings.stacked_tolerance);
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(AppError::Validation(format!(
                "stacked tolerance must be positive, got {}",
                tolerance
            )));
        }

        let filter = request.filter.market_filter();
        let range = Self::resolve_range(state, &request.filter)?;

        let days = match range {
            Some((start, end)) => {
                info!(
                    "ZoneService::select - {} to {}, zones {} / {} / {}",
                    start,
                    end,
                    zones.zone1.label(),
                    zones.zone2.label(),
                    zones.zone3.label()
                );
                let rows = state.duckdb.zone_highs_by_day(start, end, &filter, &zones)?;
                classify_rows(rows, &request.conditions, tolerance)
            }
            None => Vec::new(),
        };

        info!("ZoneService::select - {} days matched", days.len());

        Ok(Selection {
            days,
            range,
            filter,
            zones,
            conditions: request.conditions,
            hours,
        })
    }

    pub fn classify_days(state: &AppState, request: &ClassifyRequest) -> Result<Vec<ClassifiedDay>> {
        Ok(Self::select(state, request)?.days)
    }
}

/// Attach a relationship to each day; days with none are dropped
pub fn classify_rows(
    rows: Vec<DayZoneHighs>,
    conditions: &ZoneConditions,
    tolerance: f64,
) -> Vec<ClassifiedDay> {
    rows.into_iter()
        .filter_map(|row| {
            let highs = ZoneHighs {
                zone1: row.zone1_max,
                zone2: row.zone2_max,
                zone3: row.zone3_max,
            };
            classify(&highs, conditions, tolerance).map(|relationship| ClassifiedDay {
                day: row.day,
                symbols: row.symbols,
                zone1_max: row.zone1_max,
                zone2_max: row.zone2_max,
                zone3_max: row.zone3_max,
                relationship,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::zones::ZoneCondition;
    use crate::db::duckdb::tests::{d, seed};

    fn seeded_state() -> AppState {
        let state = AppState::in_memory().unwrap();
        seed(&state.duckdb);
        state
    }

    fn request(start: u32, end: u32) -> ClassifyRequest {
        ClassifyRequest {
            filter: DayFilter {
                start_date: Some(d(start)),
                end_date: Some(d(end)),
                symbol_filter: "6EH4".to_string(),
                category_filter: String::new(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let state = seeded_state();
        let err = ZoneService::classify_days(&state, &request(5, 2)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation error: Start date must be before or equal to the end date"
        );
    }

    #[test]
    fn test_default_conditions_pick_zone1_above() {
        let state = seeded_state();
        let days = ZoneService::classify_days(&state, &request(1, 31)).unwrap();

        // Day 2: zone1 1.1050 > zone2 1.1000. Day 3: zone1 1.0900 < zone2 1.0950,
        // zone2 above zone1 instead.
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].relationship, ZoneRelationship::Zone1(ZoneCondition::Above));
        assert_eq!(days[1].relationship, ZoneRelationship::Zone2(ZoneCondition::Above));
        assert_eq!(days[0].relationship.to_string(), "Zone 1 above Zone 2");
    }

    #[test]
    fn test_stacked_with_wide_tolerance() {
        let state = seeded_state();
        let mut req = request(3, 3);
        req.conditions = ZoneConditions {
            zone1: ZoneCondition::Stacked,
            zone2: ZoneCondition::Stacked,
            zone3: ZoneCondition::Stacked,
        };
        req.tolerance = Some(0.01);

        let days = ZoneService::classify_days(&state, &req).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].relationship, ZoneRelationship::Zone1(ZoneCondition::Stacked));

        req.tolerance = Some(0.001);
        assert!(ZoneService::classify_days(&state, &req).unwrap().is_empty());
    }

    #[test]
    fn test_open_range_uses_data_bounds() {
        let state = seeded_state();
        let filter = DayFilter {
            start_date: None,
            end_date: Some(d(3)),
            ..Default::default()
        };
        assert_eq!(
            ZoneService::resolve_range(&state, &filter).unwrap(),
            Some((d(2), d(3)))
        );
    }

    #[test]
    fn test_empty_table_selects_nothing() {
        let state = AppState::in_memory().unwrap();
        let selection = ZoneService::select(&state, &ClassifyRequest::default()).unwrap();
        assert!(selection.days.is_empty());
        assert!(selection.range.is_none());
    }

    #[test]
    fn test_request_deserializes_flat_filter() {
        let req: ClassifyRequest = serde_json::from_str(
            r#"{"start_date":"2024-01-02","end_date":"2024-01-03","symbol_filter":"6EH4",
                "conditions":{"zone1":"below","zone2":"above","zone3":"stacked"}}"#,
        )
        .unwrap();
        assert_eq!(req.filter.start_date, Some(d(2)));
        assert_eq!(req.conditions.zone1, ZoneCondition::Below);
        assert!(req.zones.is_none());
    }
}
