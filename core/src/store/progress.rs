//! Store methods for run progress.

use crate::{error::SlotResult, port::ProgressStore, snapshot::RunProgress};
use rusqlite::{params, OptionalExtension};

use super::SlotStore;

/// Slot used by the `ProgressStore` implementation.
pub const DEFAULT_SLOT: &str = "current";

impl SlotStore {
    /// Upsert the progress for `slot`.
    pub fn save_progress(&self, slot: &str, progress: &RunProgress) -> SlotResult<()> {
        let payload = serde_json::to_string(progress)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO run_progress (slot, run_id, payload, saved_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![slot, progress.run_id, payload, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn load_progress(&self, slot: &str) -> SlotResult<Option<RunProgress>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM run_progress WHERE slot = ?1",
                params![slot],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// When `slot` was last written, as RFC 3339.
    pub fn progress_saved_at(&self, slot: &str) -> SlotResult<Option<String>> {
        let saved_at = self
            .conn
            .query_row(
                "SELECT saved_at FROM run_progress WHERE slot = ?1",
                params![slot],
                |row| row.get(0),
            )
            .optional()?;
        Ok(saved_at)
    }

    pub fn clear_progress(&self, slot: &str) -> SlotResult<()> {
        self.conn
            .execute("DELETE FROM run_progress WHERE slot = ?1", params![slot])?;
        Ok(())
    }
}

impl ProgressStore for SlotStore {
    fn save(&mut self, progress: &RunProgress) -> SlotResult<()> {
        self.save_progress(DEFAULT_SLOT, progress)
    }

    fn load(&self) -> SlotResult<Option<RunProgress>> {
        self.load_progress(DEFAULT_SLOT)
    }
}
