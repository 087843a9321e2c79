//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist note text as rows of the `notes(id, value)` table.
//! - Own the table bootstrap used on every startup.
//!
//! # Invariants
//! - `insert` never checks for duplicates.
//! - `delete` matches by value and removes every matching row.
//! - `select_all` returns values in ascending `id` (insertion) order.

use crate::db::{open_db, open_db_in_memory, schema, DbError};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for durable note rows.
pub trait NoteRepository {
    /// Creates the backing table when absent. Safe to call repeatedly.
    fn ensure_schema(&mut self) -> RepoResult<()>;
    /// Appends one row with a freshly assigned id.
    fn insert(&mut self, value: &str) -> RepoResult<()>;
    /// Removes all rows whose value equals `value`; returns removed row count.
    fn delete(&mut self, value: &str) -> RepoResult<usize>;
    /// Returns every stored value in insertion order.
    fn select_all(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed note repository owning its connection.
pub struct SqliteNoteRepository {
    conn: Connection,
}

impl SqliteNoteRepository {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> RepoResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an existing connection without touching its schema.
    ///
    /// Callers must run `ensure_schema` before reading or writing notes.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl NoteRepository for SqliteNoteRepository {
    fn ensure_schema(&mut self) -> RepoResult<()> {
        schema::ensure_schema(&self.conn)?;
        Ok(())
    }

    fn insert(&mut self, value: &str) -> RepoResult<()> {
        self.conn
            .execute("INSERT INTO notes (value) VALUES (?1);", params![value])?;
        Ok(())
    }

    fn delete(&mut self, value: &str) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM notes WHERE value = ?1;", params![value])?;
        Ok(removed)
    }

    fn select_all(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, value FROM notes ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut values = Vec::new();

        while let Some(row) = rows.next()? {
            let value: Option<String> = row.get("value")?;
            match value {
                Some(value) => values.push(value),
                None => {
                    let id: i64 = row.get("id")?;
                    return Err(RepoError::InvalidData(format!(
                        "null value in notes.value for id {id}"
                    )));
                }
            }
        }

        Ok(values)
    }
}
