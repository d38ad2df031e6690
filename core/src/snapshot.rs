//! Run progress: the persisted state of one run.
//!
//! Written after every mutating run transition. It captures everything
//! needed to resume the run at the next node.

use crate::rng::RngSeed;
use crate::types::RunId;
use serde::{Deserialize, Serialize};

pub const SAVE_VERSION: &str = "0.1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub heat: f64,
    pub last_payout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub tier: u32,
    pub hp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunProgress {
    pub save_version: String,
    pub run_id: RunId,
    pub seed: RngSeed,
    pub day: u32,
    /// Index of the next node to resolve.
    pub node_index: u32,
    pub tickets: u32,
    pub total_credits: f64,
    pub health: f64,
    pub machine: MachineSnapshot,
    pub enemy: EnemySnapshot,
}

impl RunProgress {
    pub fn fresh(run_id: RunId, seed: RngSeed, health: f64, enemy_hp: f64) -> Self {
        Self {
            save_version: SAVE_VERSION.to_string(),
            run_id,
            seed,
            day: 1,
            node_index: 0,
            tickets: 0,
            total_credits: 0.0,
            health,
            machine: MachineSnapshot { heat: 0.0, last_payout: 0.0 },
            enemy: EnemySnapshot { tier: 1, hp: enemy_hp },
        }
    }
}
