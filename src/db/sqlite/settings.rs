//! Settings management

use crate::analysis::zones::ZoneStart;
use crate::db::sqlite::models::{DashboardSettings, SettingsUpdate};
use crate::error::{AppError, Result};
use rusqlite::Connection;

/// Get settings
pub fn get_settings(conn: &Connection) -> Result<DashboardSettings> {
    let settings = conn.query_row(
        "SELECT server_host, server_port, market_timezone, stacked_tolerance, zone_minutes,
                zone1_hour, zone1_minute, zone2_hour, zone2_minute, zone3_hour, zone3_minute,
                open_hour, open_minute, close_hour, retracement_start_hour, cache_ttl_secs
         FROM dashboard_settings WHERE id = 1",
        [],
        |row| {
            let start = |h: usize, m: usize| -> rusqlite::Result<ZoneStart> {
                Ok(ZoneStart {
                    hour: row.get(h)?,
                    minute: row.get(m)?,
                })
            };
            Ok(DashboardSettings {
                server_host: row.get(0)?,
                server_port: row.get(1)?,
                market_timezone: row.get(2)?,
                stacked_tolerance: row.get(3)?,
                zone_minutes: row.get(4)?,
                zone1_start: start(5, 6)?,
                zone2_start: start(7, 8)?,
                zone3_start: start(9, 10)?,
                session_open: start(11, 12)?,
                close_hour: row.get(13)?,
                retracement_start_hour: row.get(14)?,
                cache_ttl_secs: row.get::<_, i64>(15)?.max(0) as u64,
            })
        },
    )?;

    Ok(settings)
}

/// Update settings
pub fn update_settings(conn: &Connection, update: &SettingsUpdate) -> Result<DashboardSettings> {
    let mut updates = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(host) = &update.server_host {
        updates.push("server_host = ?");
        params.push(Box::new(host.clone()));
    }
    if let Some(port) = update.server_port {
        updates.push("server_port = ?");
        params.push(Box::new(port));
    }
    if let Some(tz) = &update.market_timezone {
        updates.push("market_timezone = ?");
        params.push(Box::new(tz.clone()));
    }
    if let Some(tolerance) = update.stacked_tolerance {
        updates.push("stacked_tolerance = ?");
        params.push(Box::new(tolerance));
    }
    if let Some(minutes) = update.zone_minutes {
        updates.push("zone_minutes = ?");
        params.push(Box::new(minutes));
    }

    let starts = [
        (update.zone1_start, "zone1_hour = ?", "zone1_minute = ?"),
        (update.zone2_start, "zone2_hour = ?", "zone2_minute = ?"),
        (update.zone3_start, "zone3_hour = ?", "zone3_minute = ?"),
        (update.session_open, "open_hour = ?", "open_minute = ?"),
    ];
    for (start, hour_col, minute_col) in starts {
        if let Some(start) = start {
            updates.push(hour_col);
            params.push(Box::new(start.hour));
            updates.push(minute_col);
            params.push(Box::new(start.minute));
        }
    }

    if let Some(hour) = update.close_hour {
        updates.push("close_hour = ?");
        params.push(Box::new(hour));
    }
    if let Some(hour) = update.retracement_start_hour {
        updates.push("retracement_start_hour = ?");
        params.push(Box::new(hour));
    }
    if let Some(ttl) = update.cache_ttl_secs {
        let ttl = i64::try_from(ttl)
            .map_err(|_| AppError::Validation(format!("cache TTL {} is out of range", ttl)))?;
        updates.push("cache_ttl_secs = ?");
        params.push(Box::new(ttl));
    }

    if !updates.is_empty() {
        updates.push("updated_at = datetime('now')");

        let sql = format!(
            "UPDATE dashboard_settings SET {} WHERE id = 1",
            updates.join(", ")
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;
    }

    get_settings(conn)
}
