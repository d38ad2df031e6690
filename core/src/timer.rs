//! Scheduled stop cadence.
//!
//! A `SpinTimer` plays a manual session the way an impatient player
//! would: one stop request every `stop_interval_ms` of simulated time,
//! confirming each column as soon as it settles. The session deadline
//! guarantees termination even if every request comes back `Busy`.

use crate::error::{SlotError, SlotResult};
use crate::evaluator::SpinResult;
use crate::heat::HeatTier;
use crate::machine::SlotMachine;
use crate::port::SlotMachinePort;
use crate::session::StopOutcome;
use crate::types::Millis;

pub const DEFAULT_STOP_INTERVAL_MS: Millis = 300.0;
pub const DEFAULT_FRAME_MS: Millis = 16.0;

/// Hard cap on frames per session, well beyond any deadline.
const MAX_FRAMES: usize = 100_000;

#[derive(Debug, Clone)]
pub struct SpinTimer {
    pub stop_interval_ms: Millis,
    accumulator: Millis,
    active: bool,
}

impl Default for SpinTimer {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_INTERVAL_MS)
    }
}

impl SpinTimer {
    pub fn new(stop_interval_ms: Millis) -> Self {
        Self { stop_interval_ms, accumulator: 0.0, active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn begin(&mut self) {
        self.active = true;
        self.accumulator = 0.0;
    }

    /// Immediate stop (player input). Restarts the cadence.
    pub fn trigger_stop(&mut self, machine: &mut SlotMachine) -> StopOutcome {
        if !self.active {
            return StopOutcome::NoneRemaining;
        }
        self.accumulator = 0.0;
        machine.request_stop_next_reel()
    }

    /// One frame: clock and deadline first, then maybe a scheduled stop,
    /// then reel motion, then confirm whatever settled. Returns the
    /// settled columns.
    pub fn tick(&mut self, machine: &mut SlotMachine, dt: Millis) -> SlotResult<Vec<usize>> {
        if !self.active {
            return Ok(Vec::new());
        }
        let scaled = machine.advance_clock(dt);
        self.accumulator += dt;
        if self.accumulator >= self.stop_interval_ms {
            self.accumulator = 0.0;
            if machine.session().is_some_and(|s| !s.timed_out) {
                machine.request_stop_next_reel();
            }
        }

        let settled = machine.advance_reels(scaled);
        for col in &settled {
            machine.confirm_reel_stopped(*col)?;
        }
        if machine.session().map_or(true, |s| s.is_finished()) {
            self.active = false;
        }
        Ok(settled)
    }

    pub fn cancel(&mut self, machine: &mut SlotMachine) {
        if !self.active {
            return;
        }
        self.active = false;
        machine.abort_session();
    }

    /// Start a session and tick it to completion.
    pub fn play_session(&mut self, machine: &mut SlotMachine, frame_ms: Millis) -> SlotResult<SpinResult> {
        machine.start_session()?;
        self.begin();
        let mut frames = 0;
        while self.active {
            self.tick(machine, frame_ms)?;
            frames += 1;
            if frames >= MAX_FRAMES {
                self.cancel(machine);
                return Err(SlotError::Other(anyhow::anyhow!(
                    "manual session did not settle within {MAX_FRAMES} frames"
                )));
            }
        }
        machine.complete()
    }
}

/// Adapts a machine to `SlotMachinePort` so rounds are played through
/// full manual sessions instead of instant spins.
pub struct ManualPlay<'a> {
    pub machine: &'a mut SlotMachine,
    pub timer: SpinTimer,
    pub frame_ms: Millis,
}

impl<'a> ManualPlay<'a> {
    pub fn new(machine: &'a mut SlotMachine, timer: SpinTimer) -> Self {
        Self { machine, timer, frame_ms: DEFAULT_FRAME_MS }
    }
}

impl SlotMachinePort for ManualPlay<'_> {
    fn spin(&mut self) -> SlotResult<SpinResult> {
        self.timer.play_session(self.machine, self.frame_ms)
    }

    fn apply_heat_tier(&mut self, tier: HeatTier) {
        self.machine.apply_heat_tier(tier);
    }

    fn heat_gain_scale(&self, result: &SpinResult) -> f64 {
        self.machine.heat_gain_scale(result)
    }
}
