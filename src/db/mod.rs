//! Database layer
//!
//! - `duckdb` holds the `f_ohlcv` fact table and every analysis query
//! - `sqlite` holds the dashboard settings

pub mod duckdb;
pub mod sqlite;
