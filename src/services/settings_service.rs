//! Settings Service

use crate::db::sqlite::{DashboardSettings, SettingsUpdate};
use crate::error::Result;
use crate::state::AppState;
use tracing::info;

pub struct SettingsService;

impl SettingsService {
    pub fn get(state: &AppState) -> Result<DashboardSettings> {
        state.settings()
    }

    /// Validate the merged result before writing, then drop cached results
    pub fn update(state: &AppState, update: &SettingsUpdate) -> Result<DashboardSettings> {
        update.validate()?;
        if update.is_empty() {
            return state.settings();
        }

        let merged = merge(state.settings()?, update);
        merged.zone_layout().validate()?;
        merged.market_hours().validate()?;

        let settings = state.sqlite.update_settings(update)?;
        state.cache.clear();

        info!("SettingsService::update - settings saved");
        Ok(settings)
    }
}

fn merge(mut current: DashboardSettings, update: &SettingsUpdate) -> DashboardSettings {
    if let Some(host) = &update.server_host {
        current.server_host = host.clone();
    }
    if let Some(port) = update.server_port {
        current.server_port = port;
    }
    if let Some(tz) = &update.market_timezone {
        current.market_timezone = tz.clone();
    }
    if let Some(tolerance) = update.stacked_tolerance {
        current.stacked_tolerance = tolerance;
    }
    if let Some(minutes) = update.zone_minutes {
        current.zone_minutes = minutes;
    }
    current.zone1_start = update.zone1_start.unwrap_or(current.zone1_start);
    current.zone2_start = update.zone2_start.unwrap_or(current.zone2_start);
    current.zone3_start = update.zone3_start.unwrap_or(current.zone3_start);
    current.session_open = update.session_open.unwrap_or(current.session_open);
    current.close_hour = update.close_hour.unwrap_or(current.close_hour);
    current.retracement_start_hour = update
        .retracement_start_hour
        .unwrap_or(current.retracement_start_hour);
    current.cache_ttl_secs = update.cache_ttl_secs.unwrap_or(current.cache_ttl_secs);
    current
}
