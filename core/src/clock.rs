//! Simulation clock. Owns elapsed time, speed and pause.
//!
//! The host's frame callback feeds raw frame deltas in; every deadline in
//! the machine is measured against `now_ms`, never against wall time.

use crate::types::Millis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpinClock {
    pub now_ms: Millis,
    pub speed:  ClockSpeed,
    pub paused: bool,
}

impl SpinClock {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            speed:  ClockSpeed::Normal,
            paused: false,
        }
    }

    /// Advance by one raw frame delta. Returns the scaled delta actually
    /// applied (0 while paused or for non-positive or non-finite input).
    pub fn advance(&mut self, raw_dt_ms: Millis) -> Millis {
        if self.paused || !(raw_dt_ms > 0.0) || !raw_dt_ms.is_finite() {
            return 0.0;
        }
        let dt = raw_dt_ms * self.speed.multiplier();
        self.now_ms += dt;
        dt
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: ClockSpeed) {
        self.speed = speed;
    }
}

impl Default for SpinClock {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClockSpeed {
    SlowMotion,  // 0.5× (debugging stop timing)
    Normal,      // 1×
    FastForward, // 4× (headless runs)
}

impl ClockSpeed {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::SlowMotion  => 0.5,
            Self::Normal      => 1.0,
            Self::FastForward => 4.0,
        }
    }
}
