//! SQLite database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    run_migration(conn, "001_dashboard_settings", CREATE_DASHBOARD_SETTINGS_TABLE)?;
    run_migration(conn, "002_cache_ttl", ADD_CACHE_TTL)?;

    tracing::info!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_DASHBOARD_SETTINGS_TABLE: &str = r#"
CREATE TABLE dashboard_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    server_host TEXT NOT NULL DEFAULT '127.0.0.1',
    server_port INTEGER NOT NULL DEFAULT 8050,
    market_timezone TEXT NOT NULL DEFAULT 'US/Eastern',
    stacked_tolerance REAL NOT NULL DEFAULT 0.1,
    zone_minutes INTEGER NOT NULL DEFAULT 60,
    zone1_hour INTEGER NOT NULL DEFAULT 18,
    zone1_minute INTEGER NOT NULL DEFAULT 0,
    zone2_hour INTEGER NOT NULL DEFAULT 3,
    zone2_minute INTEGER NOT NULL DEFAULT 0,
    zone3_hour INTEGER NOT NULL DEFAULT 9,
    zone3_minute INTEGER NOT NULL DEFAULT 30,
    open_hour INTEGER NOT NULL DEFAULT 9,
    open_minute INTEGER NOT NULL DEFAULT 30,
    close_hour INTEGER NOT NULL DEFAULT 16,
    retracement_start_hour INTEGER NOT NULL DEFAULT 8,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
INSERT OR IGNORE INTO dashboard_settings (id) VALUES (1);
"#;

/// Result cache lifetime, in seconds
const ADD_CACHE_TTL: &str = r#"
ALTER TABLE dashboard_settings ADD COLUMN cache_ttl_secs INTEGER NOT NULL DEFAULT 600;
"#;
