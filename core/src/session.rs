use crate::evaluator::SpinResult;
use crate::reel::{ReelPhase, ReelState, StopProfile};
use crate::types::{Millis, SpinId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Spinning,
    Stopping,
    Stopped,
    TimedOut,
}

/// Answer to a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "column", rename_all = "snake_case")]
pub enum StopOutcome {
    /// This column started braking.
    Stopping(usize),
    /// A player-initiated stop on this column is still settling.
    Busy(usize),
    NoneRemaining,
}

/// One manual spin in flight. Owned by its `SlotMachine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSpinSession {
    pub spin_id: SpinId,
    pub reels: Vec<ReelState>,
    pub status: SessionStatus,
    /// Where the next stop scan begins.
    pub active_reel_index: usize,
    pub started_at: Millis,
    pub deadline: Millis,
    pub time_remaining: Millis,
    pub timed_out: bool,
    pub confirmed: Vec<bool>,
    /// Set once every column is confirmed.
    pub result: Option<SpinResult>,
}

impl ManualSpinSession {
    pub fn columns(&self) -> usize {
        self.reels.len()
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.iter().filter(|c| **c).count()
    }

    pub fn all_confirmed(&self) -> bool {
        self.confirmed.iter().all(|c| *c)
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Column whose player-requested stop has not settled yet.
    pub fn manual_stop_in_flight(&self) -> Option<usize> {
        self.reels.iter().position(|r| {
            r.phase == ReelPhase::Stopping && r.stop_profile == Some(StopProfile::Manual)
        })
    }

    /// First spinning column at or after `from`, wrapping.
    pub fn next_spinning(&self, from: usize) -> Option<usize> {
        let n = self.reels.len();
        (0..n)
            .map(|offset| (from + offset) % n)
            .find(|col| self.reels[*col].phase == ReelPhase::Spinning)
    }

    /// Columns stopped but not yet confirmed by the host.
    pub fn awaiting_confirmation(&self) -> Vec<usize> {
        self.reels
            .iter()
            .enumerate()
            .filter(|(col, r)| r.phase == ReelPhase::Stopped && !self.confirmed[*col])
            .map(|(col, _)| col)
            .collect()
    }
}
