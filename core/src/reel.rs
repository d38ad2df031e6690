//! Per-column reel motion.
//!
//! PHASES: Idle → Spinning → Stopping → Stopped.
//!
//! `position` is the strip index shown in the top row; `offset_px` is how
//! far the reel has scrolled past it toward the next cell, always in
//! `[0, cell_size_px)`. A stopped reel has offset 0, and whatever it shows
//! is the result. Nothing precomputes a landing index.

use crate::config::{ReelMotionConfig, StopProfileConfig};
use crate::strip::fallback_strip;
use crate::types::{IconId, Millis};
use serde::{Deserialize, Serialize};

/// Floor under any configured stop speed so a settling reel always arrives.
const MIN_CRAWL_SPEED: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReelPhase {
    Idle,
    Spinning,
    Stopping,
    Stopped,
}

/// How a stop was initiated. Forced stops (timeouts) brake harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopProfile {
    Manual,
    Forced,
}

impl StopProfile {
    pub fn params(&self, motion: &ReelMotionConfig) -> StopProfileConfig {
        match self {
            Self::Manual => motion.manual_stop,
            Self::Forced => motion.forced_stop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelState {
    pub strip: Vec<IconId>,
    pub position: usize,
    pub offset_px: f64,
    /// px/ms.
    pub velocity: f64,
    pub phase: ReelPhase,
    pub stop_profile: Option<StopProfile>,
    pub final_index: Option<usize>,
    pub final_icon: Option<IconId>,
    pub stop_requested_at: Option<Millis>,
    /// Distance covered since the stop began.
    pub travelled_px: f64,
    entry_velocity: f64,
}

impl ReelState {
    pub fn new(strip: Vec<IconId>, position: usize) -> Self {
        let strip = if strip.is_empty() { fallback_strip(1) } else { strip };
        let position = position % strip.len();
        Self {
            strip,
            position,
            offset_px: 0.0,
            velocity: 0.0,
            phase: ReelPhase::Idle,
            stop_profile: None,
            final_index: None,
            final_icon: None,
            stop_requested_at: None,
            travelled_px: 0.0,
            entry_velocity: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.strip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strip.is_empty()
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.phase, ReelPhase::Spinning | ReelPhase::Stopping)
    }

    pub fn icon_at(&self, row: usize) -> IconId {
        self.strip[(self.position + row) % self.strip.len()]
    }

    /// The `rows` icons currently in the window, top first.
    pub fn window(&self, rows: usize) -> Vec<IconId> {
        (0..rows).map(|r| self.icon_at(r)).collect()
    }

    pub fn advance_by(&mut self, steps: usize) {
        let len = self.strip.len();
        self.position = (self.position + steps % len) % len;
    }

    pub fn begin_spin(&mut self, speed: f64) {
        self.phase = ReelPhase::Spinning;
        self.velocity = speed;
        self.offset_px = 0.0;
        self.stop_profile = None;
        self.final_index = None;
        self.final_icon = None;
        self.stop_requested_at = None;
        self.travelled_px = 0.0;
    }

    /// Begin braking. Only a spinning reel can be asked to stop.
    pub fn request_stop(&mut self, profile: StopProfile, now: Millis) -> bool {
        if self.phase != ReelPhase::Spinning {
            return false;
        }
        self.phase = ReelPhase::Stopping;
        self.stop_profile = Some(profile);
        self.stop_requested_at = Some(now);
        self.entry_velocity = self.velocity;
        self.travelled_px = 0.0;
        true
    }

    /// Jump straight to `Stopped` showing `index` at the top.
    pub fn force_stop(&mut self, index: usize) {
        self.position = index % self.strip.len();
        self.offset_px = 0.0;
        self.settle();
    }

    /// Advance one tick. Returns true only on the tick the reel settles.
    pub fn update(&mut self, dt: Millis, motion: &ReelMotionConfig) -> bool {
        if !(dt > 0.0) || !dt.is_finite() {
            return false;
        }
        match self.phase {
            ReelPhase::Idle | ReelPhase::Stopped => false,
            ReelPhase::Spinning => {
                self.scroll(self.velocity * dt, motion.cell_size_px);
                false
            }
            ReelPhase::Stopping => self.update_stopping(dt, motion),
        }
    }

    fn update_stopping(&mut self, dt: Millis, motion: &ReelMotionConfig) -> bool {
        let profile = self.stop_profile.unwrap_or(StopProfile::Manual).params(motion);
        let cell = motion.cell_size_px;

        let progress = if profile.decel_distance_px > 0.0 {
            (self.travelled_px / profile.decel_distance_px).min(1.0)
        } else {
            1.0
        };
        let floor = profile.min_speed.max(MIN_CRAWL_SPEED);
        self.velocity = self.entry_velocity + (floor - self.entry_velocity) * progress;
        let step = self.velocity * dt;

        if progress < 1.0 {
            self.scroll(step, cell);
            self.travelled_px += step;
            return false;
        }

        // At the floor speed: settle on the nearest boundary ahead.
        if self.offset_px <= motion.snap_epsilon_px {
            self.offset_px = 0.0;
            self.settle();
            return true;
        }
        if self.offset_px + step >= cell - motion.snap_epsilon_px {
            self.advance_by(1);
            self.offset_px = 0.0;
            self.settle();
            return true;
        }
        self.offset_px += step;
        self.travelled_px += step;
        false
    }

    fn scroll(&mut self, distance: f64, cell: f64) {
        self.offset_px += distance;
        if cell <= 0.0 {
            return;
        }
        let cells = (self.offset_px / cell).floor();
        if cells >= 1.0 {
            // Whole turns of the strip change nothing; only the remainder moves.
            let steps = cells % self.strip.len() as f64;
            self.offset_px = self.offset_px.rem_euclid(cell);
            self.advance_by(steps as usize);
        }
    }

    fn settle(&mut self) {
        self.velocity = 0.0;
        self.phase = ReelPhase::Stopped;
        self.final_index = Some(self.position);
        self.final_icon = Some(self.strip[self.position]);
    }
}
