//! Idempotent schema bootstrap for the notes table.
//!
//! # Invariants
//! - `ensure_schema` can run on every startup without changing stored rows.
//! - Databases stamped with a newer `user_version` are rejected untouched.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const NOTES_SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value TEXT NOT NULL
);";

/// Creates the `notes` table when absent and stamps the schema version.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    if current_version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(NOTES_SCHEMA_SQL)?;
    if current_version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    Ok(())
}

/// Reads the schema version stamped on the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{current_user_version, ensure_schema, SCHEMA_VERSION};
    use rusqlite::Connection;

    #[test]
    fn ensure_schema_stamps_version_once() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_user_version(&conn).unwrap(), 0);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
