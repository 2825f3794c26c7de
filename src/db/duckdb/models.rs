//! DuckDB data models

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// One `f_ohlcv` bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub ts_event: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub instrument_id: Option<i64>,
    pub symbol: String,
    pub category: Option<String>,
    pub hour: u32,
    pub minute: u32,
}

impl OhlcvRow {
    /// Build a bar, deriving `hour` / `minute` from the timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ts_event: NaiveDateTime,
        symbol: &str,
        category: Option<&str>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Self {
        Self {
            ts_event,
            open,
            high,
            low,
            close,
            volume,
            instrument_id: None,
            symbol: symbol.to_string(),
            category: category.map(str::to_string),
            hour: ts_event.hour(),
            minute: ts_event.minute(),
        }
    }
}

/// Per-day zone highs as produced by the zone aggregation query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayZoneHighs {
    pub day: NaiveDate,
    pub symbols: String,
    pub zone1_max: Option<f64>,
    pub zone2_max: Option<f64>,
    pub zone3_max: Option<f64>,
}

/// First retracement of the midnight open inside the session window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MidnightRetracementRow {
    pub day: NaiveDate,
    pub first_retracement: Option<NaiveDateTime>,
}

/// First retracement to the Zone 1 price after Zone 3 formed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone1RetracementRow {
    pub day: NaiveDate,
    pub zone3_formed: NaiveDateTime,
    pub first_retracement: Option<NaiveDateTime>,
}

/// Open and close of a day's opening candle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpeningCandle {
    pub day: NaiveDate,
    pub open: f64,
    pub close: f64,
}

/// Which extreme of the day a query looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayExtreme {
    High,
    Low,
}

impl DayExtreme {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            DayExtreme::High => "high",
            DayExtreme::Low => "low",
        }
    }

    pub(crate) fn aggregate(&self) -> &'static str {
        match self {
            DayExtreme::High => "MAX(high)",
            DayExtreme::Low => "MIN(low)",
        }
    }
}
