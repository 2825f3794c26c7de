//! Helpers for assembling parameterized `f_ohlcv` statements

use crate::error::{AppError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use duckdb::ToSql;
use serde::{Deserialize, Serialize};

pub(crate) const DAY_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Positional parameters collected in the order their `?` appear in the SQL
#[derive(Default)]
pub(crate) struct SqlParams {
    values: Vec<Box<dyn ToSql>>,
}

impl SqlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a value and return its placeholder
    pub fn bind<T: ToSql + 'static>(&mut self, value: T) -> &'static str {
        self.values.push(Box::new(value));
        "?"
    }

    pub fn as_refs(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|p| p.as_ref()).collect()
    }
}

/// Case-insensitive symbol / category restriction shared by the analysis queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketFilter {
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl MarketFilter {
    /// Parse comma separated filter inputs such as `"6EQ4, 6EF1"`
    pub fn parse(symbol_filter: &str, category_filter: &str) -> Self {
        Self {
            symbols: split_upper(symbol_filter),
            categories: split_upper(category_filter),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.categories.is_empty()
    }

    /// ` AND ...` clauses for `alias` (e.g. `"f."` or `""`), binding into `params`
    pub(crate) fn sql(&self, alias: &str, params: &mut SqlParams) -> String {
        let mut sql = String::new();
        if !self.symbols.is_empty() {
            let holders: Vec<&str> = self.symbols.iter().map(|s| params.bind(s.clone())).collect();
            sql.push_str(&format!(" AND UPPER({alias}symbol) IN ({})", holders.join(", ")));
        }
        if !self.categories.is_empty() {
            let holders: Vec<&str> = self
                .categories
                .iter()
                .map(|c| params.bind(c.clone()))
                .collect();
            sql.push_str(&format!(" AND UPPER({alias}category) IN ({})", holders.join(", ")));
        }
        sql
    }
}

fn split_upper(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `CAST(<ts> AS DATE) IN (...)` over the given days
pub(crate) fn day_list_sql(ts_column: &str, days: &[NaiveDate], params: &mut SqlParams) -> String {
    let holders: Vec<String> = days
        .iter()
        .map(|d| format!("CAST({} AS DATE)", params.bind(format_day(*d))))
        .collect();
    format!("CAST({ts_column} AS DATE) IN ({})", holders.join(", "))
}

pub(crate) fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub(crate) fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DAY_FORMAT)
        .map_err(|e| AppError::Internal(format!("Unexpected day '{}': {}", value, e)))
}

pub(crate) fn parse_ts(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TS_FORMAT)
        .map_err(|e| AppError::Internal(format!("Unexpected timestamp '{}': {}", value, e)))
}
