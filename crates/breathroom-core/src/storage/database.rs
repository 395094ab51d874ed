//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Completed breathing and meditation sessions
//! - Key-value store for application state (the persisted CLI timer)

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Breathing,
    Meditation,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Breathing => "breathing",
            SessionKind::Meditation => "meditation",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "breathing" => Some(SessionKind::Breathing),
            "meditation" => Some(SessionKind::Meditation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub kind: SessionKind,
    /// Breathing pattern id; empty for meditation.
    pub pattern_id: String,
    pub duration_secs: u64,
    pub cycles_completed: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn completed_on(&self) -> NaiveDate {
        self.completed_at.date_naive()
    }
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/breathroom/breathroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("breathroom.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                kind             TEXT NOT NULL,
                pattern_id       TEXT NOT NULL DEFAULT '',
                duration_secs    INTEGER NOT NULL,
                cycles_completed INTEGER NOT NULL DEFAULT 0,
                started_at       TEXT NOT NULL,
                completed_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_kind ON sessions(kind);",
        )?;
        Ok(())
    }

    /// Record a completed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        kind: SessionKind,
        pattern_id: &str,
        duration_secs: u64,
        cycles_completed: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO sessions (kind, pattern_id, duration_secs, cycles_completed, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    kind.as_str(),
                    pattern_id,
                    duration_secs,
                    cycles_completed,
                    started_at.to_rfc3339(),
                    completed_at.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All sessions, oldest first.
    pub fn all_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.query_sessions(
            "SELECT id, kind, pattern_id, duration_secs, cycles_completed, started_at, completed_at
             FROM sessions ORDER BY completed_at ASC",
            params![],
        )
    }

    /// Sessions completed in `[from, to)`, oldest first.
    pub fn sessions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>> {
        self.query_sessions(
            "SELECT id, kind, pattern_id, duration_secs, cycles_completed, started_at, completed_at
             FROM sessions WHERE completed_at >= ?1 AND completed_at < ?2
             ORDER BY completed_at ASC",
            params![from.to_rfc3339(), to.to_rfc3339()],
        )
    }

    fn query_sessions(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(sql).map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(args, |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u64>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(DatabaseError::from)?;

        let mut out = Vec::new();
        for row in rows {
            let (id, kind, pattern_id, duration_secs, cycles_completed, started, completed) =
                row.map_err(DatabaseError::from)?;
            let kind = SessionKind::parse(&kind)
                .ok_or_else(|| corrupt(format!("unknown session kind '{kind}' in row {id}")))?;
            out.push(SessionRecord {
                id,
                kind,
                pattern_id,
                duration_secs,
                cycles_completed,
                started_at: parse_ts(&started, id)?,
                completed_at: parse_ts(&completed, id)?,
            });
        }
        Ok(out)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row: &Row<'_>| row.get::<_, String>(0),
        );
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are not an error.
    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

fn corrupt(message: String) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: "sessions".into(),
        message,
    }
}

fn parse_ts(raw: &str, id: i64) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(format!("bad timestamp '{raw}' in row {id}: {e}")))
}
