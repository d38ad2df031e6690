use slotspire_core::{
    config::{HeatConfig, HeatThresholds, RoundConfig, RoundMode},
    error::{SlotError, SlotResult},
    evaluator::SpinResult,
    heat::{HeatSystem, HeatTier},
    port::SlotMachinePort,
    round::{RoundManager, RoundPhase, RoundState},
};
use std::collections::VecDeque;

// ── Test helpers ────────────────────────────────────────────────────────────

/// Machine stand-in that pays a scripted sequence and records the tiers
/// it is told about.
struct ScriptedMachine {
    payouts: VecDeque<f64>,
    tiers: Vec<HeatTier>,
    scale: f64,
}

impl ScriptedMachine {
    fn new(payouts: &[f64]) -> Self {
        Self { payouts: payouts.iter().copied().collect(), tiers: Vec::new(), scale: 1.0 }
    }
}

impl SlotMachinePort for ScriptedMachine {
    fn spin(&mut self) -> SlotResult<SpinResult> {
        let payout = self.payouts.pop_front().unwrap_or(0.0);
        Ok(result(payout))
    }

    fn apply_heat_tier(&mut self, tier: HeatTier) {
        self.tiers.push(tier);
    }

    fn heat_gain_scale(&self, _result: &SpinResult) -> f64 {
        self.scale
    }
}

fn result(payout: f64) -> SpinResult {
    SpinResult { grid: Vec::new(), payout, patterns: Vec::new(), components: Vec::new() }
}

fn heat() -> HeatSystem {
    HeatSystem::new(HeatThresholds::default(), HeatConfig::default())
}

fn started(mode: RoundMode, target: Option<f64>, initial_heat: f64) -> RoundManager {
    let config = RoundConfig::preset(mode, target);
    let mut round = RoundManager::new(heat());
    let initial = RoundState::fresh(&config, initial_heat);
    round.start(config, initial);
    round
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn safe_round_spends_six_spins() {
    let mut round = started(RoundMode::Safe, None, 0.0);
    let mut machine = ScriptedMachine::new(&[1.0; 10]);
    let mut spins = 0;
    while round.can_spin() {
        round.spin(&mut machine).unwrap();
        spins += 1;
    }
    assert_eq!(spins, 6);
    assert!(matches!(round.spin(&mut machine), Err(SlotError::NoSpinsRemaining)));
    assert_eq!(machine.payouts.len(), 4, "a refused spin must not reach the machine");
}

/// Risky rounds double every payout into credits.
#[test]
fn risky_multiplier_applies_to_credits() {
    let mut round = started(RoundMode::Risky, Some(20.0), 0.0);
    let mut machine = ScriptedMachine::new(&[4.0, 0.0, 6.0]);
    while round.can_spin() {
        round.spin(&mut machine).unwrap();
    }
    assert_eq!(round.state().credits_this_round, 20.0);

    let outcome = round.finish().unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.damage_taken, 0.0);
    assert_eq!(outcome.multiplier, 2.0);
    assert_eq!(outcome.spins_used, 3);
    assert_eq!(round.phase(), RoundPhase::Finished);
}

#[test]
fn shortfall_becomes_damage() {
    let mut round = started(RoundMode::Safe, Some(15.0), 0.0);
    let mut machine = ScriptedMachine::new(&[3.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
    while round.can_spin() {
        round.spin(&mut machine).unwrap();
    }
    let outcome = round.finish().unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.credits_gained, 5.0);
    assert_eq!(outcome.damage_taken, 10.0);
    assert!(outcome.log.first().unwrap().starts_with("Round start"));
    assert!(outcome.log.last().unwrap().contains("failed"));
}

/// Heat: 0 → 7 (first win) → 15 (second win, +1 streak) → 16 (loss).
/// The machine is told the tier after every spin.
#[test]
fn heat_tracks_streaks_and_tiers() {
    let mut round = started(RoundMode::Risky, None, 0.0);
    let mut machine = ScriptedMachine::new(&[5.0, 5.0, 0.0]);

    let (_, state) = round.spin(&mut machine).unwrap();
    assert_eq!(state.heat, 7.0);
    assert_eq!(round.win_streak(), 1);
    let (_, state) = round.spin(&mut machine).unwrap();
    assert_eq!(state.heat, 15.0);
    let (_, state) = round.spin(&mut machine).unwrap();
    assert_eq!(state.heat, 16.0);
    assert_eq!(round.win_streak(), 0);

    assert_eq!(
        machine.tiers,
        vec![HeatTier::Cold, HeatTier::WarmedUp, HeatTier::WarmedUp]
    );
}

#[test]
fn machine_scale_multiplies_heat_gain() {
    let mut round = started(RoundMode::Safe, None, 10.0);
    let mut machine = ScriptedMachine::new(&[2.0]);
    machine.scale = 0.5;
    let (_, state) = round.spin(&mut machine).unwrap();
    assert_eq!(state.heat, 13.5);
}

/// Credits and heat come in from the initial state; the budget never does.
#[test]
fn start_carries_credits_and_heat_only() {
    let config = RoundConfig::preset(RoundMode::Risky, None);
    let mut round = RoundManager::new(heat());
    let initial = RoundState {
        spins_remaining: 99,
        credits_this_round: 4.0,
        heat: 20.0,
        multiplier: 9.0,
        mode: RoundMode::Safe,
    };
    round.start(config, initial);
    let state = round.state();
    assert_eq!(state.spins_remaining, 3);
    assert_eq!(state.credits_this_round, 4.0);
    assert_eq!(state.heat, 20.0);
    assert_eq!(state.multiplier, 2.0);
    assert_eq!(state.mode, RoundMode::Risky);
}

#[test]
fn inactive_round_refuses_everything() {
    let mut round = RoundManager::new(heat());
    let mut machine = ScriptedMachine::new(&[1.0]);
    assert!(!round.can_spin());
    assert!(matches!(round.spin(&mut machine), Err(SlotError::RoundNotActive)));
    assert!(matches!(round.record_spin(&result(1.0), &mut machine), Err(SlotError::RoundNotActive)));
    assert!(matches!(round.finish(), Err(SlotError::RoundNotActive)));

    let mut round = started(RoundMode::Safe, None, 0.0);
    round.finish().unwrap();
    assert!(matches!(round.finish(), Err(SlotError::RoundNotActive)));
}

/// A host that resolved a manual session books it with `record_spin`.
#[test]
fn record_spin_books_an_external_result() {
    let mut round = started(RoundMode::Safe, None, 0.0);
    let mut machine = ScriptedMachine::new(&[]);
    let state = round.record_spin(&result(3.0), &mut machine).unwrap();
    assert_eq!(state.spins_remaining, 5);
    assert_eq!(state.credits_this_round, 3.0);
}

#[test]
fn mode_presets() {
    assert_eq!(RoundMode::Safe.spins_allowed(), 6);
    assert_eq!(RoundMode::Risky.multiplier(), 2.0);
    assert_eq!(RoundMode::Risky.label(), "Risky (3 spins, 2.0x)");
}
