//! SQLite connection and schema management.

use std::path::Path;

use rusqlite::Connection;

use crate::errors::TemperError;

/// Schema of the append-only sample table. Records are only ever inserted
/// and read back; no updates, deletes or secondary indices.
///
/// Printed by `temper-logger -S` so a new database can be initialized with
/// `temper-logger -S | sqlite3 FILE`.
pub const DB_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS temps(
    id          INTEGER PRIMARY KEY ASC,
    timestamp   INTEGER NOT NULL, /* unix timestamp of the sample */
    tempc       REAL    NOT NULL  /* temperature in celsius */
    );
";

/// Open the database file, creating an empty one if it does not exist.
pub fn open_database(path: &Path) -> Result<Connection, TemperError> {
    Connection::open(path).map_err(|source| TemperError::QueryError {
        context: "open",
        source,
    })
}

/// Create the sample table. The logger itself never calls this; the
/// documented init path is piping [`DB_SCHEMA`] through the sqlite3 shell.
pub fn initialize_schema(conn: &Connection) -> Result<(), TemperError> {
    conn.execute_batch(DB_SCHEMA)
        .map_err(|source| TemperError::QueryError {
            context: "initialize schema",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_accepted_by_sqlite() {
        let conn = Connection::open_in_memory().expect("in-memory database");
        initialize_schema(&conn).expect("schema should apply cleanly");
        // Re-applying must be a no-op thanks to IF NOT EXISTS.
        initialize_schema(&conn).expect("schema is idempotent");
    }
}
