//! The slot machine: strips, positions, the manual spin session, and the
//! instant spin used by headless rounds.
//!
//! EXECUTION ORDER (every `update` call):
//!   1. advance the session clock, recompute time remaining
//!   2. deadline reached for the first time → forced stop on every
//!      still-spinning column
//!   3. advance reel motion
//!   4. report columns that settled this tick
//!
//! The timeout check runs before motion, so a reel can never slip through
//! a tick on the manual profile after the deadline. Hosts that issue stop
//! requests from inside a tick call `advance_clock`, then stop, then
//! `advance_reels`, which keeps the same order.
//!
//! A settled column is NOT part of the result until the host confirms it
//! with `confirm_reel_stopped`. The grid is scored once, when the last
//! column is confirmed.

use crate::clock::SpinClock;
use crate::config::ReelMotionConfig;
use crate::error::{SlotError, SlotResult};
use crate::evaluator::{evaluate_grid, Evaluation, SpinResult};
use crate::event::SlotEvent;
use crate::heat::HeatTier;
use crate::modifiers::{apply_tier, TierEffects};
use crate::port::{SlotMachinePort, SpinDiagnostics};
use crate::reel::{ReelPhase, ReelState, StopProfile};
use crate::rng::{RngSeed, SpinRng};
use crate::runtime::MachineRuntime;
use crate::session::{ManualSpinSession, SessionStatus, StopOutcome};
use crate::strip::{generate_strips, is_degenerate};
use crate::types::{Grid, IconId, Millis, SpinId};

pub struct SlotMachine {
    /// Runtime as built from config, before tier modifiers.
    base: MachineRuntime,
    runtime: MachineRuntime,
    tier_effects: TierEffects,
    motion: ReelMotionConfig,
    rng: SpinRng,
    strips: Vec<Vec<IconId>>,
    positions: Vec<usize>,
    order_locked: bool,
    clock: SpinClock,
    session: Option<ManualSpinSession>,
    next_spin_id: SpinId,
    last_result: Option<SpinResult>,
    diagnostics: Option<Box<dyn SpinDiagnostics>>,
}

impl SlotMachine {
    pub fn new(runtime: MachineRuntime, motion: ReelMotionConfig, seed: impl Into<RngSeed>) -> Self {
        let (tiered, tier_effects) = apply_tier(&runtime, HeatTier::Cold);
        let mut machine = Self {
            base: runtime,
            runtime: tiered,
            tier_effects,
            motion,
            rng: SpinRng::new(seed),
            strips: Vec::new(),
            positions: Vec::new(),
            order_locked: false,
            clock: SpinClock::new(),
            session: None,
            next_spin_id: 1,
            last_result: None,
            diagnostics: None,
        };
        machine.initialize_reels();
        machine
    }

    pub fn with_diagnostics(mut self, sink: Box<dyn SpinDiagnostics>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    fn emit(&mut self, event: SlotEvent) {
        if let Some(sink) = self.diagnostics.as_mut() {
            sink.record(&event);
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn runtime(&self) -> &MachineRuntime {
        &self.runtime
    }

    pub fn base_runtime(&self) -> &MachineRuntime {
        &self.base
    }

    pub fn tier(&self) -> HeatTier {
        self.tier_effects.tier
    }

    pub fn tier_effects(&self) -> &TierEffects {
        &self.tier_effects
    }

    pub fn motion(&self) -> &ReelMotionConfig {
        &self.motion
    }

    pub fn seed(&self) -> &RngSeed {
        self.rng.seed()
    }

    pub fn clock(&self) -> &SpinClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SpinClock {
        &mut self.clock
    }

    pub fn session(&self) -> Option<&ManualSpinSession> {
        self.session.as_ref()
    }

    pub fn last_result(&self) -> Option<&SpinResult> {
        self.last_result.as_ref()
    }

    pub fn columns(&self) -> usize {
        self.strips.len()
    }

    pub fn strips(&self) -> &[Vec<IconId>] {
        &self.strips
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// What the player sees: live reel positions while a session runs,
    /// the resting positions otherwise.
    pub fn visible_grid(&self) -> Grid<IconId> {
        let rows = self.runtime.grid_height;
        match &self.session {
            Some(session) => (0..rows)
                .map(|r| session.reels.iter().map(|reel| reel.icon_at(r)).collect())
                .collect(),
            None => self.resting_grid(),
        }
    }

    fn resting_grid(&self) -> Grid<IconId> {
        (0..self.runtime.grid_height)
            .map(|r| {
                self.strips
                    .iter()
                    .zip(&self.positions)
                    .map(|(strip, pos)| strip[(pos + r) % strip.len()])
                    .collect()
            })
            .collect()
    }

    /// `count` icons of column `col` starting at its resting position.
    /// Empty for an unknown column.
    pub fn reel_preview(&self, col: usize, count: usize) -> Vec<IconId> {
        let (Some(strip), Some(pos)) = (self.strips.get(col), self.positions.get(col)) else {
            return Vec::new();
        };
        (0..count).map(|i| strip[(pos + i) % strip.len()]).collect()
    }

    // ── Reels ─────────────────────────────────────────────────

    fn initialize_reels(&mut self) {
        let weights = self.runtime.weights();
        self.strips = generate_strips(
            &weights,
            self.runtime.grid_width,
            self.runtime.reel_length,
            &mut self.rng,
        );
        let mut positions = Vec::with_capacity(self.strips.len());
        for strip in &self.strips {
            positions.push(self.rng.next_index(strip.len()));
        }
        self.positions = positions;

        let degenerate: Vec<usize> = self
            .strips
            .iter()
            .enumerate()
            .filter(|(_, s)| is_degenerate(s))
            .map(|(col, _)| col)
            .collect();
        if !degenerate.is_empty() {
            log::warn!(
                "Machine {}: columns {:?} hold only the fallback icon",
                self.runtime.id,
                degenerate
            );
        }
        let seed = self.rng.seed().to_string();
        self.emit(SlotEvent::ReelsRegenerated { seed, degenerate_columns: degenerate });
    }

    /// Rebuild every strip from the current (tier-adjusted) weights.
    /// Reseeds first when `seed` is given.
    pub fn regenerate_reels(&mut self, seed: Option<RngSeed>) -> SlotResult<()> {
        if let Some(session) = &self.session {
            return Err(SlotError::SessionAlreadyActive { spin_id: session.spin_id });
        }
        if let Some(seed) = seed {
            self.rng.set_seed(seed);
        }
        self.initialize_reels();
        Ok(())
    }

    /// One full rotation plus a random extra per column.
    fn advance_positions(&mut self) {
        for col in 0..self.strips.len() {
            let len = self.strips[col].len();
            let advance = len + self.rng.next_index(len);
            self.positions[col] = (self.positions[col] + advance) % len;
        }
    }

    pub fn begin_round(&mut self) {
        self.order_locked = false;
    }

    pub fn lock_reel_order(&mut self) {
        self.order_locked = true;
    }

    /// Permute columns: slot `i` takes the reel that was at `order[i]`.
    /// Ignored (returns false) while locked, during a session, or for
    /// anything that is not a permutation of the columns.
    pub fn reorder_reels(&mut self, order: &[usize]) -> bool {
        if self.order_locked || self.session.is_some() || order.len() != self.strips.len() {
            return false;
        }
        let mut seen = vec![false; order.len()];
        for &idx in order {
            if idx >= order.len() || seen[idx] {
                return false;
            }
            seen[idx] = true;
        }
        self.strips = order.iter().map(|&i| self.strips[i].clone()).collect();
        self.positions = order.iter().map(|&i| self.positions[i]).collect();
        true
    }

    // ── Heat tier ─────────────────────────────────────────────

    /// Switch tier modifiers. Payout and heat effects apply to the next
    /// evaluation; weight changes reach the strips on the next
    /// `regenerate_reels`.
    pub fn apply_heat_tier(&mut self, tier: HeatTier) {
        let from = self.tier_effects.tier;
        if from == tier {
            return;
        }
        let (runtime, effects) = apply_tier(&self.base, tier);
        self.runtime = runtime;
        self.tier_effects = effects;
        self.emit(SlotEvent::HeatTierChanged { from, to: tier });
    }

    pub fn heat_gain_scale(&self, result: &SpinResult) -> f64 {
        let mut families = Vec::new();
        for p in &result.patterns {
            if !families.contains(&p.kind) {
                families.push(p.kind);
            }
        }
        self.base.base_heat_scalar * self.tier_effects.heat_scale_for(&families)
    }

    fn evaluate(&self, grid: &Grid<IconId>) -> Evaluation {
        let mut eval = evaluate_grid(grid, &self.runtime.icons);
        self.tier_effects.apply(&mut eval, &self.runtime.patterns);
        eval
    }

    /// Instant spin: advance every reel and score the resting grid.
    pub fn spin(&mut self) -> SlotResult<SpinResult> {
        if let Some(session) = &self.session {
            return Err(SlotError::SessionAlreadyActive { spin_id: session.spin_id });
        }
        self.advance_positions();
        let grid = self.resting_grid();
        let eval = self.evaluate(&grid);
        let result = SpinResult::new(grid, eval);

        let spin_id = self.next_spin_id;
        self.next_spin_id += 1;
        log::debug!("Spin {spin_id}: payout {}", result.payout);
        self.emit(SlotEvent::SpinCompleted {
            spin_id,
            payout: result.payout,
            patterns: result.patterns.len(),
            timed_out: false,
        });
        self.last_result = Some(result.clone());
        Ok(result)
    }

    // ── Manual session ────────────────────────────────────────

    pub fn start_session(&mut self) -> SlotResult<&ManualSpinSession> {
        if let Some(session) = &self.session {
            return Err(SlotError::SessionAlreadyActive { spin_id: session.spin_id });
        }
        self.advance_positions();

        let reels: Vec<ReelState> = self
            .strips
            .iter()
            .zip(&self.positions)
            .map(|(strip, pos)| {
                let mut reel = ReelState::new(strip.clone(), *pos);
                reel.begin_spin(self.motion.spin_speed);
                reel
            })
            .collect();

        let spin_id = self.next_spin_id;
        self.next_spin_id += 1;
        let now = self.clock.now_ms;
        let duration = self.runtime.spin_duration_ms;
        let columns = reels.len();

        self.session = Some(ManualSpinSession {
            spin_id,
            confirmed: vec![false; columns],
            reels,
            status: SessionStatus::Spinning,
            active_reel_index: 0,
            started_at: now,
            deadline: now + duration,
            time_remaining: duration,
            timed_out: false,
            result: None,
        });
        log::debug!("Spin {spin_id}: session started at {now}ms");
        self.emit(SlotEvent::SessionStarted { spin_id, at: now, deadline: now + duration, columns });

        self.session.as_ref().ok_or(SlotError::NoActiveSession)
    }

    /// Brake the next spinning column, scanning forward from the last one
    /// stopped. Only one player stop may be settling at a time.
    pub fn request_stop_next_reel(&mut self) -> StopOutcome {
        let now = self.clock.now_ms;
        let Some(session) = self.session.as_mut() else {
            return StopOutcome::NoneRemaining;
        };
        if let Some(col) = session.manual_stop_in_flight() {
            return StopOutcome::Busy(col);
        }
        let Some(col) = session.next_spinning(session.active_reel_index) else {
            return StopOutcome::NoneRemaining;
        };
        session.reels[col].request_stop(StopProfile::Manual, now);
        session.active_reel_index = col;
        session.status = SessionStatus::Stopping;
        let spin_id = session.spin_id;

        self.emit(SlotEvent::StopRequested { spin_id, column: col, at: now });
        StopOutcome::Stopping(col)
    }

    /// One tick. Returns the columns that settled during it.
    pub fn update(&mut self, raw_dt_ms: f64) -> Vec<usize> {
        let dt = self.advance_clock(raw_dt_ms);
        self.advance_reels(dt)
    }

    /// First half of a tick: move the clock and apply the deadline.
    /// Returns the scaled delta the reels should move by. Stop requests
    /// issued between this and `advance_reels` land after the timeout.
    pub fn advance_clock(&mut self, raw_dt_ms: f64) -> Millis {
        let dt = self.clock.advance(raw_dt_ms);
        let now = self.clock.now_ms;

        let deadline_hit = match self.session.as_mut() {
            None => return dt,
            Some(session) => {
                session.time_remaining = (session.deadline - now).max(0.0);
                session.time_remaining <= 0.0 && !session.timed_out
            }
        };
        if deadline_hit {
            self.force_timeout_stop();
        }
        dt
    }

    /// Second half of a tick: reel motion. Returns newly settled columns.
    pub fn advance_reels(&mut self, dt: Millis) -> Vec<usize> {
        let motion = self.motion;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let spin_id = session.spin_id;
        let mut settled = Vec::new();
        let mut events = Vec::new();
        for (col, reel) in session.reels.iter_mut().enumerate() {
            if reel.update(dt, &motion) {
                settled.push(col);
                events.push(SlotEvent::ReelSettled {
                    spin_id,
                    column: col,
                    final_index: reel.position,
                    final_icon: reel.strip[reel.position],
                    profile: reel.stop_profile,
                });
            }
        }
        for event in events {
            self.emit(event);
        }
        settled
    }

    /// Deadline stop: every still-spinning column brakes on the forced
    /// profile. No-op without a session or once already timed out.
    pub fn force_timeout_stop(&mut self) {
        let now = self.clock.now_ms;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.timed_out {
            return;
        }
        session.timed_out = true;
        session.time_remaining = 0.0;
        if session.result.is_none() {
            session.status = SessionStatus::Stopping;
        }
        let columns: Vec<usize> = session
            .reels
            .iter_mut()
            .enumerate()
            .filter_map(|(col, reel)| reel.request_stop(StopProfile::Forced, now).then_some(col))
            .collect();
        let spin_id = session.spin_id;
        log::debug!("Spin {spin_id}: timed out, forcing columns {columns:?}");
        self.emit(SlotEvent::TimeoutForced { spin_id, at: now, columns });
    }

    /// Accept a settled column's final index as authoritative. Confirming
    /// twice is harmless. Confirming the last column scores the grid.
    pub fn confirm_reel_stopped(&mut self, col: usize) -> SlotResult<()> {
        let session = self.session.as_mut().ok_or(SlotError::NoActiveSession)?;
        let columns = session.reels.len();
        let reel = session
            .reels
            .get(col)
            .ok_or(SlotError::ColumnOutOfRange { column: col, columns })?;
        if reel.phase != ReelPhase::Stopped {
            return Err(SlotError::ReelNotStopped { column: col });
        }
        if !session.confirmed[col] {
            self.positions[col] = reel.final_index.unwrap_or(reel.position);
            session.confirmed[col] = true;
            session.active_reel_index = (col + 1) % columns;
        }
        if !session.all_confirmed() || session.result.is_some() {
            return Ok(());
        }

        let grid = self.resting_grid();
        let eval = self.evaluate(&grid);
        let result = SpinResult::new(grid, eval);
        let Some(session) = self.session.as_mut() else {
            return Err(SlotError::NoActiveSession);
        };
        session.status = if session.timed_out {
            SessionStatus::TimedOut
        } else {
            SessionStatus::Stopped
        };
        let event = SlotEvent::SpinCompleted {
            spin_id: session.spin_id,
            payout: result.payout,
            patterns: result.patterns.len(),
            timed_out: session.timed_out,
        };
        log::debug!("Spin {}: scored {}", session.spin_id, result.payout);
        session.result = Some(result);
        self.emit(event);
        Ok(())
    }

    /// Close a finished session and hand back its result.
    pub fn complete(&mut self) -> SlotResult<SpinResult> {
        let session = self.session.as_ref().ok_or(SlotError::NoActiveSession)?;
        if !session.all_confirmed() {
            return Err(SlotError::SessionNotFinished {
                stopped: session.confirmed_count(),
                total: session.columns(),
            });
        }
        let session = self.session.take().ok_or(SlotError::NoActiveSession)?;
        let result = match session.result {
            Some(result) => result,
            None => {
                let grid = self.resting_grid();
                let eval = self.evaluate(&grid);
                SpinResult::new(grid, eval)
            }
        };
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Drop the session. Moving reels freeze where they are and those
    /// positions are kept. Returns false when there was nothing to abort.
    pub fn abort_session(&mut self) -> bool {
        let now = self.clock.now_ms;
        let Some(mut session) = self.session.take() else {
            return false;
        };
        for (col, reel) in session.reels.iter_mut().enumerate() {
            if reel.is_moving() {
                reel.force_stop(reel.position);
            }
            self.positions[col] = reel.position;
        }
        log::debug!("Spin {}: aborted", session.spin_id);
        self.emit(SlotEvent::SessionAborted { spin_id: session.spin_id, at: now });
        true
    }
}

impl SlotMachinePort for SlotMachine {
    fn spin(&mut self) -> SlotResult<SpinResult> {
        SlotMachine::spin(self)
    }

    fn apply_heat_tier(&mut self, tier: HeatTier) {
        SlotMachine::apply_heat_tier(self, tier)
    }

    fn heat_gain_scale(&self, result: &SpinResult) -> f64 {
        SlotMachine::heat_gain_scale(self, result)
    }
}
