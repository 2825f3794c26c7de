//! DuckDB database module for the `f_ohlcv` fact table
//!
//! Every zone / retracement / daily statistic is a parameterized query over
//! this single table. Day lists, symbol and category filters are bound as
//! positional parameters; zone and hour bounds are validated integers.

pub mod models;
mod migrations;
mod query;

pub use query::MarketFilter;

use crate::analysis::zones::{ZoneLayout, ZoneStart};
use crate::analysis::MarketHours;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use duckdb::Connection;
use models::{
    DayExtreme, DayZoneHighs, MidnightRetracementRow, OhlcvRow, OpeningCandle, Zone1RetracementRow,
};
use parking_lot::Mutex;
use query::{day_list_sql, format_day, format_ts, parse_day, parse_ts, SqlParams};
use std::path::Path;

const MINUTE_OF_DAY: &str = "(hour * 60 + minute)";

/// DuckDB database wrapper
pub struct DuckDb {
    conn: Mutex<Connection>,
}

impl DuckDb {
    /// Create new DuckDB connection
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests and throwaway sessions
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };

        // Run migrations
        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Ingest ==========

    /// Insert bars, replacing any existing bar with the same (ts_event, symbol)
    pub fn insert_bars(&self, bars: &[OhlcvRow]) -> Result<usize> {
        let mut conn = self.conn.lock();

        let tx = conn.transaction()?;

        let mut stmt = tx.prepare(
            "INSERT INTO f_ohlcv (ts_event, open, high, low, close, volume, instrument_id, symbol, category, hour, minute)
             VALUES (CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (ts_event, symbol) DO UPDATE SET
               open = excluded.open, high = excluded.high, low = excluded.low,
               close = excluded.close, volume = excluded.volume,
               instrument_id = excluded.instrument_id, category = excluded.category,
               hour = excluded.hour, minute = excluded.minute",
        )?;

        let mut count = 0;
        for bar in bars {
            stmt.execute(duckdb::params![
                format_ts(bar.ts_event),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume,
                bar.instrument_id,
                bar.symbol,
                bar.category,
                bar.hour as i32,
                bar.minute as i32,
            ])?;
            count += 1;
        }

        drop(stmt);
        tx.commit()?;

        Ok(count)
    }

    // ========== Catalog ==========

    /// Distinct non-null categories, ascending
    pub fn categories(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM f_ohlcv WHERE category IS NOT NULL ORDER BY category",
        )?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Distinct symbols, optionally restricted to one category, ascending
    pub fn symbols(&self, category: Option<&str>) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let rows = match category {
            Some(category) => {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT symbol FROM f_ohlcv
                     WHERE symbol IS NOT NULL AND category = ?
                     ORDER BY symbol",
                )?;
                let rows = stmt
                    .query_map([category], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT DISTINCT symbol FROM f_ohlcv WHERE symbol IS NOT NULL ORDER BY symbol",
                )?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    /// First and last calendar day with data, `None` when the table is empty
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let conn = self.conn.lock();
        let (min, max): (Option<String>, Option<String>) = conn.query_row(
            "SELECT strftime(MIN(CAST(ts_event AS DATE)), '%Y-%m-%d'),
                    strftime(MAX(CAST(ts_event AS DATE)), '%Y-%m-%d')
             FROM f_ohlcv",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        match (min, max) {
            (Some(min), Some(max)) => Ok(Some((parse_day(&min)?, parse_day(&max)?))),
            _ => Ok(None),
        }
    }

    /// Bars of one category/symbol, optionally bounded by calendar days, ascending
    pub fn query_bars(
        &self,
        category: &str,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvRow>> {
        let mut params = SqlParams::new();
        let mut sql = format!(
            "SELECT strftime(ts_event, '%Y-%m-%d %H:%M:%S'), open, high, low, close, volume,
                    instrument_id, symbol, category, hour, minute
             FROM f_ohlcv
             WHERE category = {} AND symbol = {}",
            params.bind(category.to_string()),
            params.bind(symbol.to_string()),
        );

        match (start, end) {
            (Some(start), Some(end)) => sql.push_str(&format!(
                " AND CAST(ts_event AS DATE) BETWEEN CAST({} AS DATE) AND CAST({} AS DATE)",
                params.bind(format_day(start)),
                params.bind(format_day(end)),
            )),
            (Some(start), None) => sql.push_str(&format!(
                " AND CAST(ts_event AS DATE) >= CAST({} AS DATE)",
                params.bind(format_day(start)),
            )),
            (None, Some(end)) => sql.push_str(&format!(
                " AND CAST(ts_event AS DATE) <= CAST({} AS DATE)",
                params.bind(format_day(end)),
            )),
            (None, None) => {}
        }
        sql.push_str(" ORDER BY ts_event ASC");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params.as_refs().as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, i32>(9)?,
                    row.get::<_, i32>(10)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(ts, open, high, low, close, volume, instrument_id, symbol, category, hour, minute)| {
                    Ok(OhlcvRow {
                        ts_event: parse_ts(&ts)?,
                        open,
                        high,
                        low,
                        close,
                        volume,
                        instrument_id,
                        symbol,
                        category,
                        hour: hour.max(0) as u32,
                        minute: minute.max(0) as u32,
                    })
                },
            )
            .collect()
    }

    // ========== Zone analysis ==========

    /// Highest high inside each zone, per calendar day in `[start, end]`
    pub fn zone_highs_by_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: &MarketFilter,
        zones: &ZoneLayout,
    ) -> Result<Vec<DayZoneHighs>> {
        let mut params = SqlParams::new();
        let start_holder = params.bind(format_day(start));
        let end_holder = params.bind(format_day(end));
        let filter_sql = filter.sql("", &mut params);

        let sql = format!(
            "SELECT strftime(CAST(ts_event AS DATE), '%Y-%m-%d') AS day,
                    MAX(CASE WHEN {z1} THEN high END) AS zone1_max,
                    MAX(CASE WHEN {z2} THEN high END) AS zone2_max,
                    MAX(CASE WHEN {z3} THEN high END) AS zone3_max,
                    array_to_string(list_sort(list_distinct(list(symbol))), ', ') AS symbols
             FROM f_ohlcv
             WHERE CAST(ts_event AS DATE) BETWEEN CAST({start_holder} AS DATE) AND CAST({end_holder} AS DATE){filter_sql}
             GROUP BY day
             ORDER BY day",
            z1 = zones.zone1.sql_predicate(MINUTE_OF_DAY),
            z2 = zones.zone2.sql_predicate(MINUTE_OF_DAY),
            z3 = zones.zone3.sql_predicate(MINUTE_OF_DAY),
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params.as_refs().as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(day, zone1_max, zone2_max, zone3_max, symbols)| {
                Ok(DayZoneHighs {
                    day: parse_day(&day)?,
                    symbols: symbols.unwrap_or_default(),
                    zone1_max,
                    zone2_max,
                    zone3_max,
                })
            })
            .collect()
    }

    // ========== Retracements ==========

    /// First bar of the retracement window whose range holds the midnight open.
    ///
    /// Days without a 00:00 bar are not returned.
    pub fn midnight_retracements(
        &self,
        days: &[NaiveDate],
        filter: &MarketFilter,
        hours: &MarketHours,
    ) -> Result<Vec<MidnightRetracementRow>> {
        if days.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = SqlParams::new();
        let opens_days = day_list_sql("ts_event", days, &mut params);
        let opens_filter = filter.sql("", &mut params);
        let touch_filter = filter.sql("f.", &mut params);

        let sql = format!(
            "WITH midnight_opens AS (
                SELECT CAST(ts_event AS DATE) AS day, arg_min(open, ts_event) AS midnight_open
                FROM f_ohlcv
                WHERE hour = 0 AND minute = 0 AND {opens_days}{opens_filter}
                GROUP BY CAST(ts_event AS DATE)
            ),
            first_retracements AS (
                SELECT mo.day, MIN(f.ts_event) AS first_retracement_time
                FROM midnight_opens mo
                LEFT JOIN f_ohlcv f ON CAST(f.ts_event AS DATE) = mo.day
                    AND f.hour >= {start_hour} AND f.hour < {close_hour}
                    AND f.low <= mo.midnight_open AND f.high >= mo.midnight_open{touch_filter}
                GROUP BY mo.day
            )
            SELECT strftime(day, '%Y-%m-%d'),
                   strftime(first_retracement_time, '%Y-%m-%d %H:%M:%S')
            FROM first_retracements
            ORDER BY day",
            start_hour = hours.retracement_start_hour,
            close_hour = hours.close_hour,
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params.as_refs().as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(day, first)| {
                Ok(MidnightRetracementRow {
                    day: parse_day(&day)?,
                    first_retracement: first.as_deref().map(parse_ts).transpose()?,
                })
            })
            .collect()
    }

    /// First revisit of the Zone 1 reference price after Zone 3 has formed.
    ///
    /// The Zone 1 price is the lowest open of its formation window; Zone 3 is
    /// formed at the last bar of its formation window. Only bars before the
    /// close hour count. Days without a formed Zone 3 are not returned.
    pub fn zone1_retracements(
        &self,
        days: &[NaiveDate],
        filter: &MarketFilter,
        zone1: ZoneStart,
        zone3: ZoneStart,
        hours: &MarketHours,
    ) -> Result<Vec<Zone1RetracementRow>> {
        if days.is_empty() {
            return Ok(Vec::new());
        }

        for start in [zone1, zone3] {
            if start.minute_of_day() + hours.formation_minutes >= 24 * 60 {
                return Err(AppError::Validation(format!(
                    "Formation window starting at {} must end before midnight",
                    start
                )));
            }
        }

        let formation_window = |start: ZoneStart| {
            let from = start.minute_of_day();
            let to = from + hours.formation_minutes;
            format!("{MINUTE_OF_DAY} BETWEEN {from} AND {to}")
        };

        let mut params = SqlParams::new();
        let z1_days = day_list_sql("ts_event", days, &mut params);
        let z1_filter = filter.sql("", &mut params);
        let z3_days = day_list_sql("ts_event", days, &mut params);
        let z3_filter = filter.sql("", &mut params);
        let touch_filter = filter.sql("f.", &mut params);

        let sql = format!(
            "WITH zone1_prices AS (
                SELECT CAST(ts_event AS DATE) AS day, MIN(open) AS zone1_price
                FROM f_ohlcv
                WHERE {z1_window} AND {z1_days}{z1_filter}
                GROUP BY CAST(ts_event AS DATE)
            ),
            zone3_formed AS (
                SELECT CAST(ts_event AS DATE) AS day, MAX(ts_event) AS zone3_end_time
                FROM f_ohlcv
                WHERE {z3_window} AND {z3_days}{z3_filter}
                GROUP BY CAST(ts_event AS DATE)
            ),
            first_zone1_retracements AS (
                SELECT z3.day, MIN(f.ts_event) AS first_retracement_time
                FROM zone3_formed z3
                JOIN zone1_prices z1 ON z1.day = z3.day
                JOIN f_ohlcv f ON CAST(f.ts_event AS DATE) = z3.day
                    AND f.ts_event > z3.zone3_end_time
                    AND f.ts_event < CAST(z3.day AS TIMESTAMP) + INTERVAL '{close_hour} hours'
                    AND f.low <= z1.zone1_price AND f.high >= z1.zone1_price{touch_filter}
                GROUP BY z3.day
            )
            SELECT strftime(z3.day, '%Y-%m-%d'),
                   strftime(z3.zone3_end_time, '%Y-%m-%d %H:%M:%S'),
                   strftime(r.first_retracement_time, '%Y-%m-%d %H:%M:%S')
            FROM zone3_formed z3
            LEFT JOIN first_zone1_retracements r ON r.day = z3.day
            ORDER BY z3.day",
            z1_window = formation_window(zone1),
            z3_window = formation_window(zone3),
            close_hour = hours.close_hour,
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params.as_refs().as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(day, formed, first)| {
                Ok(Zone1RetracementRow {
                    day: parse_day(&day)?,
                    zone3_formed: parse_ts(&formed)?,
                    first_retracement: first.as_deref().map(parse_ts).transpose()?,
                })
            })
            .collect()
    }

    // ========== Daily statistics ==========

    /// Days whose regular-session extreme was printed during the opening hour
    pub fn extreme_in_open_count(
        &self,
        days: &[NaiveDate],
        filter: &MarketFilter,
        extreme: DayExtreme,
        hours: &MarketHours,
    ) -> Result<i64> {
        if days.is_empty() {
            return Ok(0);
        }

        let mut params = SqlParams::new();
        let extreme_days = day_list_sql("ts_event", days, &mut params);
        let extreme_filter = filter.sql("", &mut params);
        let open_filter = filter.sql("f.", &mut params);

        let sql = format!(
            "WITH day_extremes AS (
                SELECT CAST(ts_event AS DATE) AS day, {aggregate} AS day_extreme
                FROM f_ohlcv
                WHERE {extreme_days}
                  AND hour >= {open_hour} AND hour < {close_hour}{extreme_filter}
                GROUP BY CAST(ts_event AS DATE)
            )
            SELECT COUNT(*) FROM day_extremes d
            WHERE EXISTS (
                SELECT 1
                FROM f_ohlcv f
                WHERE CAST(f.ts_event AS DATE) = d.day
                  AND f.hour = {open_hour}
                  AND f.{column} = d.day_extreme{open_filter}
            )",
            aggregate = extreme.aggregate(),
            column = extreme.column(),
            open_hour = hours.open.hour,
            close_hour = hours.close_hour,
        );

        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row(&sql, params.as_refs().as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// Timestamp at which each day's high (or low) was first printed
    pub fn first_extreme_times(
        &self,
        days: &[NaiveDate],
        filter: &MarketFilter,
        extreme: DayExtreme,
    ) -> Result<Vec<(NaiveDate, chrono::NaiveDateTime)>> {
        if days.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = SqlParams::new();
        let extreme_days = day_list_sql("ts_event", days, &mut params);
        let extreme_filter = filter.sql("", &mut params);
        let time_filter = filter.sql("f.", &mut params);

        let sql = format!(
            "WITH day_extremes AS (
                SELECT CAST(ts_event AS DATE) AS day, {aggregate} AS day_extreme
                FROM f_ohlcv
                WHERE {extreme_days}{extreme_filter}
                GROUP BY CAST(ts_event AS DATE)
            )
            SELECT strftime(d.day, '%Y-%m-%d'),
                   strftime(MIN(f.ts_event), '%Y-%m-%d %H:%M:%S')
            FROM day_extremes d
            JOIN f_ohlcv f ON CAST(f.ts_event AS DATE) = d.day
                AND f.{column} = d.day_extreme{time_filter}
            GROUP BY d.day
            ORDER BY d.day",
            aggregate = extreme.aggregate(),
            column = extreme.column(),
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params.as_refs().as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(day, ts)| Ok((parse_day(&day)?, parse_ts(&ts)?)))
            .collect()
    }

    /// Open and close of the bar stamped exactly at the session open, per day.
    ///
    /// One candle per day. When several symbols print at the open, the bar of
    /// the alphabetically first symbol is used, so open and close always come
    /// from the same bar.
    pub fn opening_candles(
        &self,
        days: &[NaiveDate],
        filter: &MarketFilter,
        open: ZoneStart,
    ) -> Result<Vec<OpeningCandle>> {
        if days.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = SqlParams::new();
        let candle_days = day_list_sql("ts_event", days, &mut params);
        let candle_filter = filter.sql("", &mut params);

        let sql = format!(
            "SELECT strftime(day, '%Y-%m-%d'), open, close
             FROM (
                SELECT CAST(ts_event AS DATE) AS day, open, close,
                       ROW_NUMBER() OVER (
                           PARTITION BY CAST(ts_event AS DATE)
                           ORDER BY ts_event, symbol
                       ) AS rn
                FROM f_ohlcv
                WHERE hour = {hour} AND minute = {minute} AND {candle_days}{candle_filter}
             ) AS candles
             WHERE rn = 1
             ORDER BY day",
            hour = open.hour,
            minute = open.minute,
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params.as_refs().as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(day, open, close)| {
                Ok(OpeningCandle {
                    day: parse_day(&day)?,
                    open,
                    close,
                })
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::zones::ZoneWindow;
    use chrono::NaiveDateTime;

    pub(crate) fn ts(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    pub(crate) fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    pub(crate) fn bar(
        day: u32,
        h: u32,
        m: u32,
        symbol: &str,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> OhlcvRow {
        OhlcvRow::new(ts(day, h, m), symbol, Some("6E"), open, high, low, close, 100)
    }

    /// Two synthetic trading days for 6EH4 plus an ES bar on a third day.
    ///
    /// Day 2: zone1 (18:00) high 1.1050, zone2 (03:00) high 1.1000,
    /// zone3 (09:30) high 1.1100; midnight open 1.0950 revisited at 10:40.
    /// Day 3: zone1 high 1.0900, zone2 high 1.0950, zone3 high 1.0940;
    /// midnight open never revisited.
    pub(crate) fn seed(db: &DuckDb) {
        let mut bars = vec![
            // Day 2
            bar(2, 0, 0, "6EH4", 1.0950, 1.0960, 1.0940, 1.0955),
            bar(2, 3, 0, "6EH4", 1.0990, 1.1000, 1.0980, 1.0995),
            bar(2, 3, 45, "6EH4", 1.0985, 1.0990, 1.0970, 1.0975),
            bar(2, 8, 15, "6EH4", 1.0990, 1.1010, 1.0980, 1.1000),
            bar(2, 9, 0, "6EH4", 1.1000, 1.1120, 1.0990, 1.1080),
            bar(2, 9, 30, "6EH4", 1.1010, 1.1100, 1.1000, 1.1090),
            bar(2, 9, 35, "6EH4", 1.1090, 1.1095, 1.1060, 1.1070),
            bar(2, 10, 40, "6EH4", 1.1000, 1.1005, 1.0945, 1.0960),
            bar(2, 11, 0, "6EH4", 1.0960, 1.0970, 1.0930, 1.0940),
            bar(2, 18, 0, "6EH4", 1.0980, 1.1050, 1.0975, 1.1040),
            // Day 3
            bar(3, 0, 0, "6EH4", 1.0800, 1.0810, 1.0790, 1.0805),
            bar(3, 3, 10, "6EH4", 1.0900, 1.0950, 1.0890, 1.0940),
            bar(3, 9, 30, "6EH4", 1.0930, 1.0940, 1.0920, 1.0925),
            bar(3, 12, 0, "6EH4", 1.0925, 1.0960, 1.0910, 1.0950),
            bar(3, 18, 5, "6EH4", 1.0890, 1.0900, 1.0880, 1.0885),
        ];
        let mut es = bar(4, 9, 30, "ESH4", 4800.0, 4810.0, 4790.0, 4795.0);
        es.category = Some("ES".to_string());
        bars.push(es);

        db.insert_bars(&bars).unwrap();
    }

    fn seeded() -> DuckDb {
        let db = DuckDb::in_memory().unwrap();
        seed(&db);
        db
    }

    #[test]
    fn test_insert_is_upsert() {
        let db = seeded();
        let replacement = bar(2, 0, 0, "6EH4", 1.2, 1.3, 1.1, 1.25);
        db.insert_bars(&[replacement]).unwrap();

        let bars = db.query_bars("6E", "6EH4", Some(d(2)), Some(d(2))).unwrap();
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[0].open, 1.2);
        assert_eq!(bars[0].hour, 0);
    }

    #[test]
    fn test_catalog_queries() {
        let db = seeded();
        assert_eq!(db.categories().unwrap(), vec!["6E", "ES"]);
        assert_eq!(db.symbols(None).unwrap(), vec!["6EH4", "ESH4"]);
        assert_eq!(db.symbols(Some("ES")).unwrap(), vec!["ESH4"]);
        assert_eq!(db.date_range().unwrap(), Some((d(2), d(4))));
    }

    #[test]
    fn test_empty_date_range() {
        let db = DuckDb::in_memory().unwrap();
        assert_eq!(db.date_range().unwrap(), None);
    }

    #[test]
    fn test_query_bars_date_bounds() {
        let db = seeded();
        assert_eq!(db.query_bars("6E", "6EH4", None, None).unwrap().len(), 15);
        assert_eq!(db.query_bars("6E", "6EH4", Some(d(3)), None).unwrap().len(), 5);
        assert_eq!(db.query_bars("6E", "6EH4", None, Some(d(2))).unwrap().len(), 10);

        let bars = db.query_bars("6E", "6EH4", None, None).unwrap();
        assert!(bars.windows(2).all(|w| w[0].ts_event < w[1].ts_event));
    }

    #[test]
    fn test_zone_highs_by_day() {
        let db = seeded();
        let filter = MarketFilter::parse("6eh4", "");
        let rows = db
            .zone_highs_by_day(d(1), d(31), &filter, &ZoneLayout::default())
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].day, d(2));
        assert_eq!(rows[0].zone1_max, Some(1.1050));
        assert_eq!(rows[0].zone2_max, Some(1.1000));
        assert_eq!(rows[0].zone3_max, Some(1.1100));
        assert_eq!(rows[0].symbols, "6EH4");
        // 03:10 sits in zone 2, 18:05 in zone 1
        assert_eq!(rows[1].zone1_max, Some(1.0900));
        assert_eq!(rows[1].zone2_max, Some(1.0950));
    }

    #[test]
    fn test_zone_highs_midnight_crossing_zone() {
        let db = seeded();
        let mut zones = ZoneLayout::default();
        zones.zone2 = ZoneWindow::new(ZoneStart::new(23, 30).unwrap(), 60).unwrap();

        let rows = db
            .zone_highs_by_day(d(2), d(2), &MarketFilter::default(), &zones)
            .unwrap();
        // Only the 00:00 bar falls in 23:30-00:30 on day 2
        assert_eq!(rows[0].zone2_max, Some(1.0960));
    }

    #[test]
    fn test_category_filter() {
        let db = seeded();
        let rows = db
            .zone_highs_by_day(d(1), d(31), &MarketFilter::parse("", "es"), &ZoneLayout::default())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day, d(4));
        assert_eq!(rows[0].symbols, "ESH4");
    }

    #[test]
    fn test_midnight_retracements() {
        let db = seeded();
        let rows = db
            .midnight_retracements(
                &[d(2), d(3)],
                &MarketFilter::default(),
                &MarketHours::default(),
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].first_retracement, Some(ts(2, 10, 40)));
        assert_eq!(rows[1].first_retracement, None);
    }

    #[test]
    fn test_zone1_retracements() {
        let db = seeded();
        let zones = ZoneLayout::default();
        let rows = db
            .zone1_retracements(
                &[d(2), d(3)],
                &MarketFilter::parse("6EH4", ""),
                zones.zone1.start,
                zones.zone3.start,
                &MarketHours::default(),
            )
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].zone3_formed, ts(2, 9, 35));
        // Zone 1 price 1.0980: 10:40 range [1.0945, 1.1005] holds it
        assert_eq!(rows[0].first_retracement, Some(ts(2, 10, 40)));
        // Zone 1 price 1.0890 is never revisited on day 3
        assert_eq!(rows[1].zone3_formed, ts(3, 9, 30));
        assert_eq!(rows[1].first_retracement, None);
    }

    #[test]
    fn test_extreme_in_open_count() {
        let db = seeded();
        let hours = MarketHours::default();
        let days = [d(2), d(3)];
        let filter = MarketFilter::default();

        // Day 2 session high 1.1120 printed at 09:00; day 3 high 1.0960 at 12:00
        assert_eq!(
            db.extreme_in_open_count(&days, &filter, DayExtreme::High, &hours).unwrap(),
            1
        );
        // Day 2 session low 1.0930 at 11:00; day 3 low 1.0910 at 12:00
        assert_eq!(
            db.extreme_in_open_count(&days, &filter, DayExtreme::Low, &hours).unwrap(),
            0
        );
    }

    #[test]
    fn test_first_extreme_times() {
        let db = seeded();
        let times = db
            .first_extreme_times(&[d(2), d(3)], &MarketFilter::default(), DayExtreme::High)
            .unwrap();
        assert_eq!(times, vec![(d(2), ts(2, 9, 0)), (d(3), ts(3, 12, 0))]);

        let times = db
            .first_extreme_times(&[d(3)], &MarketFilter::default(), DayExtreme::Low)
            .unwrap();
        assert_eq!(times, vec![(d(3), ts(3, 0, 0))]);
    }

    #[test]
    fn test_opening_candles() {
        let db = seeded();
        let candles = db
            .opening_candles(
                &[d(2), d(3), d(4)],
                &MarketFilter::parse("", "6E"),
                MarketHours::default().open,
            )
            .unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 1.1010);
        assert_eq!(candles[0].close, 1.1090);
        assert_eq!(candles[1].close, 1.0925);
    }

    #[test]
    fn test_opening_candle_picks_one_symbol_per_day() {
        let db = DuckDb::in_memory().unwrap();
        db.insert_bars(&[
            bar(5, 9, 30, "ZNH4", 110.0, 111.5, 109.5, 111.0),
            bar(5, 9, 30, "6EM4", 1.2000, 1.2010, 1.0990, 1.1000),
        ])
        .unwrap();

        let candles = db
            .opening_candles(&[d(5)], &MarketFilter::default(), MarketHours::default().open)
            .unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!((candles[0].open, candles[0].close), (1.2000, 1.1000));
    }

    #[test]
    fn test_empty_day_list_short_circuits() {
        let db = seeded();
        let hours = MarketHours::default();
        assert!(db
            .midnight_retracements(&[], &MarketFilter::default(), &hours)
            .unwrap()
            .is_empty());
        assert_eq!(
            db.extreme_in_open_count(&[], &MarketFilter::default(), DayExtreme::High, &hours)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_on_disk_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ohlcv.duckdb");
        {
            let db = DuckDb::new(&path).unwrap();
            seed(&db);
        }
        let db = DuckDb::new(&path).unwrap();
        assert_eq!(db.symbols(None).unwrap().len(), 2);
    }
}
