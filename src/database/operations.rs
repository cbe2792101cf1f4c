//! Sample Writer and Sample Reader over the SQLite store.

use std::path::Path;
use std::time::Duration;

use log::debug;
use rusqlite::{params, Connection, ToSql};
use time::OffsetDateTime;

use crate::database::connection::open_database;
use crate::errors::TemperError;
use crate::models::{QueryWindow, Reading};
use crate::retry;

/// Transient storage failures are retried this many times in total...
const MAX_WRITE_ATTEMPTS: u32 = 10;
/// ...with this pause between attempts.
const WRITE_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Rows come back in batches that start at this capacity and grow by
/// doubling as needed.
const INITIAL_BATCH_CAPACITY: usize = 256;

const INSERT_SQL: &str = "INSERT INTO temps (timestamp, tempc) VALUES (?1, ?2)";
const SELECT_ALL_SQL: &str = "SELECT timestamp, tempc FROM temps ORDER BY timestamp";
const SELECT_LAST_N_SQL: &str =
    "SELECT timestamp, tempc FROM temps ORDER BY timestamp DESC LIMIT ?1";
const SELECT_SINCE_SQL: &str =
    "SELECT timestamp, tempc FROM temps WHERE timestamp > ?1 ORDER BY timestamp";

/// Durably append one reading.
///
/// Opens a connection scoped to this single call, then executes the fixed
/// INSERT with up to [`MAX_WRITE_ATTEMPTS`] attempts on the same
/// connection, pausing [`WRITE_RETRY_PAUSE`] between attempts. Exhaustion
/// surfaces as [`TemperError::PersistenceExhausted`]; the caller decides
/// whether to keep the acquisition loop running.
pub fn store_reading(db_path: &Path, reading: &Reading) -> Result<(), TemperError> {
    let conn = open_database(db_path)?;
    insert_with_retry(&conn, reading, MAX_WRITE_ATTEMPTS, WRITE_RETRY_PAUSE)
}

fn insert_with_retry(
    conn: &Connection,
    reading: &Reading,
    max_attempts: u32,
    pause: Duration,
) -> Result<(), TemperError> {
    retry::with_retry(max_attempts, pause, || {
        conn.execute(INSERT_SQL, params![reading.timestamp, reading.tempc])
            .map(|_| ())
    })
    .map_err(|source| TemperError::PersistenceExhausted {
        attempts: max_attempts,
        source,
    })
}

/// Fetch the batch of historical readings selected by `window`.
///
/// The returned batch is always in ascending timestamp order; for
/// [`QueryWindow::LastN`] the most-recent-first query result is reversed
/// in memory so display and statistics both consume it chronologically.
pub fn fetch_readings(db_path: &Path, window: &QueryWindow) -> Result<Vec<Reading>, TemperError> {
    let conn = open_database(db_path)?;

    let mut readings = match window {
        QueryWindow::LastN(n) => query_readings(&conn, SELECT_LAST_N_SQL, &[n]),
        QueryWindow::Lookback(secs) => {
            let cutoff = OffsetDateTime::now_utc().unix_timestamp() - *secs as i64;
            query_readings(&conn, SELECT_SINCE_SQL, &[&cutoff])
        }
        QueryWindow::All => query_readings(&conn, SELECT_ALL_SQL, &[]),
    }?;

    if matches!(window, QueryWindow::LastN(_)) {
        readings.reverse();
    }
    debug!("Fetched {} reading(s) for {:?}", readings.len(), window);
    Ok(readings)
}

fn query_readings(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<Reading>, TemperError> {
    let query_error = |context| {
        move |source| TemperError::QueryError { context, source }
    };

    let mut stmt = conn.prepare(sql).map_err(query_error("prepare"))?;
    let mut rows = stmt.query(params).map_err(query_error("query"))?;

    let mut readings = Vec::with_capacity(INITIAL_BATCH_CAPACITY);
    while let Some(row) = rows.next().map_err(query_error("step"))? {
        readings.push(Reading {
            timestamp: row.get(0).map_err(query_error("column timestamp"))?,
            tempc: row.get(1).map_err(query_error("column tempc"))?,
        });
    }
    Ok(readings)
}
