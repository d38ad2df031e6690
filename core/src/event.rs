//! Machine lifecycle events.
//!
//! RULE: The machine never calls a renderer or logger directly for state
//! changes a host might care about. It emits a `SlotEvent` to whatever
//! `SpinDiagnostics` sink was attached at construction.

use crate::error::SlotResult;
use crate::heat::HeatTier;
use crate::reel::StopProfile;
use crate::types::{IconId, Millis, RunId, SpinId};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotEvent {
    // ── Session ────────────────────────────────────
    SessionStarted {
        spin_id: SpinId,
        at: Millis,
        deadline: Millis,
        columns: usize,
    },
    StopRequested {
        spin_id: SpinId,
        column: usize,
        at: Millis,
    },
    TimeoutForced {
        spin_id: SpinId,
        at: Millis,
        columns: Vec<usize>,
    },
    ReelSettled {
        spin_id: SpinId,
        column: usize,
        final_index: usize,
        final_icon: IconId,
        profile: Option<StopProfile>,
    },
    SpinCompleted {
        spin_id: SpinId,
        payout: f64,
        patterns: usize,
        timed_out: bool,
    },
    SessionAborted {
        spin_id: SpinId,
        at: Millis,
    },

    // ── Machine ────────────────────────────────────
    ReelsRegenerated {
        seed: String,
        degenerate_columns: Vec<usize>,
    },
    HeatTierChanged {
        from: HeatTier,
        to: HeatTier,
    },
}

impl SlotEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. }   => "session_started",
            Self::StopRequested { .. }    => "stop_requested",
            Self::TimeoutForced { .. }    => "timeout_forced",
            Self::ReelSettled { .. }      => "reel_settled",
            Self::SpinCompleted { .. }    => "spin_completed",
            Self::SessionAborted { .. }   => "session_aborted",
            Self::ReelsRegenerated { .. } => "reels_regenerated",
            Self::HeatTierChanged { .. }  => "heat_tier_changed",
        }
    }

    /// The spin this event belongs to; 0 for machine-level events.
    pub fn spin_id(&self) -> SpinId {
        match self {
            Self::SessionStarted { spin_id, .. }
            | Self::StopRequested { spin_id, .. }
            | Self::TimeoutForced { spin_id, .. }
            | Self::ReelSettled { spin_id, .. }
            | Self::SpinCompleted { spin_id, .. }
            | Self::SessionAborted { spin_id, .. } => *spin_id,
            Self::ReelsRegenerated { .. } | Self::HeatTierChanged { .. } => 0,
        }
    }
}

/// A persisted event_log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub spin_id: SpinId,
    pub event_type: String,
    pub payload: String, // JSON-serialized SlotEvent
}

impl EventLogEntry {
    pub fn from_event(run_id: &str, event: &SlotEvent) -> SlotResult<Self> {
        Ok(Self {
            id: None,
            run_id: run_id.to_string(),
            spin_id: event.spin_id(),
            event_type: event.event_type().to_string(),
            payload: serde_json::to_string(event)?,
        })
    }

    pub fn event(&self) -> SlotResult<SlotEvent> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}
