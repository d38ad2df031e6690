//! Fight manager: a fixed number of rounds played back to back.
//!
//! Heat carries from one round into the next. The fight pays one ticket
//! when every round passed.

use crate::config::FightConfig;
use crate::error::{SlotError, SlotResult};
use crate::evaluator::SpinResult;
use crate::heat::HeatSystem;
use crate::port::SlotMachinePort;
use crate::round::{RoundManager, RoundOutcome, RoundPhase, RoundState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightOutcome {
    pub success: bool,
    pub tickets_earned: u32,
    pub total_credits: f64,
    pub heat_end: f64,
    pub damage_taken: f64,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    /// 1-based number of the round just finished.
    pub round: u32,
    pub outcome: RoundOutcome,
    pub done: bool,
}

pub struct FightManager {
    heat_system: HeatSystem,
    config: Option<FightConfig>,
    current_round: u32,
    round: RoundManager,
    total_credits: f64,
    heat: f64,
    damage_taken: f64,
    all_passed: bool,
    log: Vec<String>,
    finished: bool,
}

impl FightManager {
    pub fn new(heat_system: HeatSystem) -> Self {
        Self {
            heat_system,
            config: None,
            current_round: 0,
            round: RoundManager::new(heat_system),
            total_credits: 0.0,
            heat: 0.0,
            damage_taken: 0.0,
            all_passed: true,
            log: Vec::new(),
            finished: false,
        }
    }

    pub fn start(&mut self, config: FightConfig, initial_heat: f64) {
        self.current_round = 1;
        self.total_credits = 0.0;
        self.heat = initial_heat.max(0.0);
        self.damage_taken = 0.0;
        self.all_passed = true;
        self.log.clear();
        self.finished = false;
        self.start_round(&config);
        log::info!("Fight started: {} rounds, heat {}", config.rounds, self.heat);
        self.config = Some(config);
    }

    fn start_round(&mut self, config: &FightConfig) {
        self.round = RoundManager::new(self.heat_system);
        self.round
            .start(config.round.clone(), RoundState::fresh(&config.round, self.heat));
    }

    fn check_active(&self) -> SlotResult<()> {
        if self.config.is_none() || self.finished {
            return Err(SlotError::FightNotActive);
        }
        Ok(())
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn round_state(&self) -> &RoundState {
        self.round.state()
    }

    pub fn can_spin(&self) -> bool {
        !self.finished && self.round.can_spin()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn next_spin(&mut self, machine: &mut dyn SlotMachinePort) -> SlotResult<(SpinResult, RoundState)> {
        self.check_active()?;
        let (spin, state) = self.round.spin(machine)?;
        self.heat = state.heat;
        Ok((spin, state))
    }

    pub fn record_spin(
        &mut self,
        result: &SpinResult,
        machine: &mut dyn SlotMachinePort,
    ) -> SlotResult<RoundState> {
        self.check_active()?;
        let state = self.round.record_spin(result, machine)?;
        self.heat = state.heat;
        Ok(state)
    }

    /// Close the current round and, unless it was the last, start the next.
    pub fn finish_round(&mut self) -> SlotResult<RoundReport> {
        self.check_active()?;
        let rounds = self.config.as_ref().map_or(0, |c| c.rounds);
        let outcome = self.round.finish()?;

        self.total_credits += outcome.credits_gained;
        self.heat = outcome.heat_end;
        self.damage_taken += outcome.damage_taken;
        self.all_passed &= outcome.success;
        self.log.extend(outcome.log.iter().cloned());
        self.log.push(format!(
            "Round {} {}",
            self.current_round,
            if outcome.success { "passed" } else { "failed" }
        ));

        let round = self.current_round;
        if round >= rounds {
            self.finished = true;
            log::info!(
                "Fight finished: credits {} heat {} success {}",
                self.total_credits, self.heat, self.all_passed
            );
            return Ok(RoundReport { round, outcome, done: true });
        }

        self.current_round += 1;
        if let Some(config) = self.config.clone() {
            self.start_round(&config);
        }
        Ok(RoundReport { round, outcome, done: false })
    }

    /// Available once the last round has finished.
    pub fn summary(&self) -> Option<FightOutcome> {
        if !self.finished {
            return None;
        }
        Some(FightOutcome {
            success: self.all_passed,
            tickets_earned: u32::from(self.all_passed),
            total_credits: self.total_credits,
            heat_end: self.heat,
            damage_taken: self.damage_taken,
            log: self.log.clone(),
        })
    }

    /// Spend every spin of every round through `machine`.
    pub fn play(&mut self, machine: &mut dyn SlotMachinePort) -> SlotResult<FightOutcome> {
        self.check_active()?;
        loop {
            while self.round.can_spin() {
                self.next_spin(machine)?;
            }
            if self.round.phase() != RoundPhase::Active {
                return Err(SlotError::RoundNotActive);
            }
            if self.finish_round()?.done {
                break;
            }
        }
        self.summary().ok_or(SlotError::FightNotActive)
    }
}
