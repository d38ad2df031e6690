//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Managers reach it through `ProgressStore` or the event log methods;
//! they never execute SQL directly.

use crate::{error::SlotResult, event::EventLogEntry, types::SpinId};
use rusqlite::{params, Connection};

mod progress;

pub use progress::DEFAULT_SLOT;

pub struct SlotStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SlotStore {
    pub fn open(path: &str) -> SlotResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SlotResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> SlotResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SlotResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SlotResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, spin_id, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.spin_id as i64,
                entry.event_type,
                entry.payload,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn events_for_spin(&self, run_id: &str, spin_id: SpinId) -> SlotResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, spin_id, event_type, payload
             FROM event_log WHERE run_id = ?1 AND spin_id = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, spin_id as i64], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn events_for_run(&self, run_id: &str) -> SlotResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, spin_id, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Number of logged events of one type (for tests and summaries).
    pub fn event_count(&self, run_id: &str, event_type: &str) -> SlotResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventLogEntry> {
    Ok(EventLogEntry {
        id: Some(row.get(0)?),
        run_id: row.get(1)?,
        spin_id: row.get::<_, i64>(2)? as u64,
        event_type: row.get(3)?,
        payload: row.get(4)?,
    })
}
