//! Round manager: one spin budget with its credits and the heat it builds.
//!
//! PHASES: NotStarted → Active → Finished.

use crate::config::{RoundConfig, RoundMode};
use crate::error::{SlotError, SlotResult};
use crate::evaluator::SpinResult;
use crate::heat::HeatSystem;
use crate::port::SlotMachinePort;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub spins_remaining: u32,
    pub credits_this_round: f64,
    pub heat: f64,
    pub multiplier: f64,
    pub mode: RoundMode,
}

impl RoundState {
    /// Full budget from `config`, no credits, starting at `heat`.
    pub fn fresh(config: &RoundConfig, heat: f64) -> Self {
        Self {
            spins_remaining: config.spins_allowed,
            credits_this_round: 0.0,
            heat: heat.max(0.0),
            multiplier: config.multiplier,
            mode: config.mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    NotStarted,
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub success: bool,
    pub credits_gained: f64,
    pub heat_end: f64,
    /// Shortfall against the target; 0 on success.
    pub damage_taken: f64,
    pub multiplier: f64,
    pub mode: RoundMode,
    pub spins_used: u32,
    pub log: Vec<String>,
}

pub struct RoundManager {
    heat: HeatSystem,
    config: Option<RoundConfig>,
    state: RoundState,
    phase: RoundPhase,
    win_streak: u32,
    spins_used: u32,
    log: Vec<String>,
}

impl RoundManager {
    pub fn new(heat: HeatSystem) -> Self {
        let placeholder = RoundConfig::preset(RoundMode::Safe, None);
        Self {
            heat,
            state: RoundState::fresh(&placeholder, 0.0),
            config: None,
            phase: RoundPhase::NotStarted,
            win_streak: 0,
            spins_used: 0,
            log: Vec::new(),
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn win_streak(&self) -> u32 {
        self.win_streak
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Begin a round. The budget, multiplier and mode always come from
    /// `config`; credits and heat carry over from `initial`.
    pub fn start(&mut self, config: RoundConfig, initial: RoundState) {
        self.state = RoundState {
            spins_remaining: config.spins_allowed,
            credits_this_round: initial.credits_this_round.max(0.0),
            heat: initial.heat.max(0.0),
            multiplier: config.multiplier,
            mode: config.mode,
        };
        self.config = Some(config);
        self.phase = RoundPhase::Active;
        self.win_streak = 0;
        self.spins_used = 0;
        self.log.clear();
        self.log.push(format!(
            "Round start: {} spins, {} credits, heat {}",
            self.state.spins_remaining, self.state.credits_this_round, self.state.heat
        ));
    }

    pub fn can_spin(&self) -> bool {
        self.phase == RoundPhase::Active && self.state.spins_remaining > 0
    }

    fn check_can_spin(&self) -> SlotResult<()> {
        if self.phase != RoundPhase::Active {
            return Err(SlotError::RoundNotActive);
        }
        if self.state.spins_remaining == 0 {
            return Err(SlotError::NoSpinsRemaining);
        }
        Ok(())
    }

    /// Ask the machine for one spin and book it.
    pub fn spin(&mut self, machine: &mut dyn SlotMachinePort) -> SlotResult<(SpinResult, RoundState)> {
        self.check_can_spin()?;
        let result = machine.spin()?;
        let state = self.record_spin(&result, machine)?;
        Ok((result, state))
    }

    /// Book a spin the host resolved itself (a manual session).
    pub fn record_spin(
        &mut self,
        result: &SpinResult,
        machine: &mut dyn SlotMachinePort,
    ) -> SlotResult<RoundState> {
        self.check_can_spin()?;
        self.state.spins_remaining -= 1;
        self.spins_used += 1;

        let credits = result.payout.max(0.0) * self.state.multiplier;
        self.state.credits_this_round += credits;

        if result.is_win() {
            self.win_streak += 1;
        } else {
            self.win_streak = 0;
        }

        let scale = machine.heat_gain_scale(result);
        self.state.heat =
            self.heat
                .on_spin_scaled(self.state.heat, result.payout, self.win_streak, scale);
        let tier = self.heat.tier(self.state.heat);
        machine.apply_heat_tier(tier);

        log::debug!(
            "Round spin: payout {} credits {} heat {} tier {tier}",
            result.payout, credits, self.state.heat
        );
        self.log.push(format!(
            "Spin: payout={} credits={} streak={} heat={} tier={tier}",
            result.payout, credits, self.win_streak, self.state.heat
        ));
        Ok(self.state.clone())
    }

    /// Close the round. Without a target every round succeeds.
    pub fn finish(&mut self) -> SlotResult<RoundOutcome> {
        if self.phase != RoundPhase::Active {
            return Err(SlotError::RoundNotActive);
        }
        let target = self.config.as_ref().and_then(|c| c.target_credits);
        let credits = self.state.credits_this_round;
        let success = target.map_or(true, |t| credits >= t);
        let damage_taken = match target {
            Some(t) if !success => (t - credits).max(0.0),
            _ => 0.0,
        };

        self.phase = RoundPhase::Finished;
        self.log.push(format!(
            "Round end: {} credits, {}",
            credits,
            if success { "passed" } else { "failed" }
        ));

        Ok(RoundOutcome {
            success,
            credits_gained: credits,
            heat_end: self.state.heat,
            damage_taken,
            multiplier: self.state.multiplier,
            mode: self.state.mode,
            spins_used: self.spins_used,
            log: self.log.clone(),
        })
    }
}
