//! SQLite data models

use crate::analysis::zones::{ZoneLayout, ZoneStart, ZoneWindow};
use crate::analysis::MarketHours;
use crate::error::{AppError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest allowed result cache lifetime (one week)
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Dashboard settings (single row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub server_host: String,
    pub server_port: u16,
    /// IANA name, e.g. `US/Eastern`
    pub market_timezone: String,
    pub stacked_tolerance: f64,
    pub zone_minutes: u32,
    pub zone1_start: ZoneStart,
    pub zone2_start: ZoneStart,
    pub zone3_start: ZoneStart,
    pub session_open: ZoneStart,
    pub close_hour: u32,
    pub retracement_start_hour: u32,
    pub cache_ttl_secs: u64,
}

impl DashboardSettings {
    /// Default zones built from the stored starts and duration
    pub fn zone_layout(&self) -> ZoneLayout {
        ZoneLayout {
            zone1: ZoneWindow {
                start: self.zone1_start,
                duration_minutes: self.zone_minutes,
            },
            zone2: ZoneWindow {
                start: self.zone2_start,
                duration_minutes: self.zone_minutes,
            },
            zone3: ZoneWindow {
                start: self.zone3_start,
                duration_minutes: self.zone_minutes,
            },
        }
    }

    pub fn market_hours(&self) -> MarketHours {
        MarketHours {
            open: self.session_open,
            close_hour: self.close_hour,
            retracement_start_hour: self.retracement_start_hour,
            ..MarketHours::default()
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.market_timezone)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Partial settings update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub market_timezone: Option<String>,
    pub stacked_tolerance: Option<f64>,
    pub zone_minutes: Option<u32>,
    pub zone1_start: Option<ZoneStart>,
    pub zone2_start: Option<ZoneStart>,
    pub zone3_start: Option<ZoneStart>,
    pub session_open: Option<ZoneStart>,
    pub close_hour: Option<u32>,
    pub retracement_start_hour: Option<u32>,
    pub cache_ttl_secs: Option<u64>,
}

impl SettingsUpdate {
    /// Field-level checks; cross-field checks run on the merged settings
    pub fn validate(&self) -> Result<()> {
        if let Some(host) = &self.server_host {
            if host.trim().is_empty() {
                return Err(AppError::Validation("server host cannot be empty".to_string()));
            }
        }
        if self.server_port == Some(0) {
            return Err(AppError::Validation("server port cannot be 0".to_string()));
        }
        if let Some(tz) = &self.market_timezone {
            parse_timezone(tz)?;
        }
        if let Some(tolerance) = self.stacked_tolerance {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err(AppError::Validation(format!(
                    "stacked tolerance must be positive, got {}",
                    tolerance
                )));
            }
        }
        if let Some(ttl) = self.cache_ttl_secs {
            if ttl > MAX_CACHE_TTL_SECS {
                return Err(AppError::Validation(format!(
                    "cache TTL must be at most {} seconds, got {}",
                    MAX_CACHE_TTL_SECS, ttl
                )));
            }
        }
        for start in [
            self.zone1_start,
            self.zone2_start,
            self.zone3_start,
            self.session_open,
        ]
        .into_iter()
        .flatten()
        {
            start.validate()?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.server_host.is_none()
            && self.server_port.is_none()
            && self.market_timezone.is_none()
            && self.stacked_tolerance.is_none()
            && self.zone_minutes.is_none()
            && self.zone1_start.is_none()
            && self.zone2_start.is_none()
            && self.zone3_start.is_none()
            && self.session_open.is_none()
            && self.close_hour.is_none()
            && self.retracement_start_hour.is_none()
            && self.cache_ttl_secs.is_none()
    }
}

pub(crate) fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Unknown timezone: {}", name)))
}
