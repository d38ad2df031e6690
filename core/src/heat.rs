//! Heat: the escalation meter fed by every spin and bled off between nodes.
//!
//! Pure arithmetic. Callers own and persist the heat value.

use crate::config::{HeatConfig, HeatThresholds};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatTier {
    Cold,
    WarmedUp,
    OnFire,
    BurningUp,
    Breakdown,
}

impl fmt::Display for HeatTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cold      => "cold",
            Self::WarmedUp  => "warmed_up",
            Self::OnFire    => "on_fire",
            Self::BurningUp => "burning_up",
            Self::Breakdown => "breakdown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSystem {
    pub thresholds: HeatThresholds,
    pub config: HeatConfig,
}

impl HeatSystem {
    pub fn new(thresholds: HeatThresholds, config: HeatConfig) -> Self {
        Self { thresholds, config }
    }

    /// Highest tier whose threshold the heat has reached.
    pub fn tier(&self, heat: f64) -> HeatTier {
        let t = &self.thresholds;
        if heat >= t.breakdown {
            HeatTier::Breakdown
        } else if heat >= t.burning_up {
            HeatTier::BurningUp
        } else if heat >= t.on_fire {
            HeatTier::OnFire
        } else if heat >= t.warm_up {
            HeatTier::WarmedUp
        } else {
            HeatTier::Cold
        }
    }

    /// Streaks only ever add heat: the first win adds nothing extra, each
    /// further consecutive win adds one more, up to the cap.
    pub fn streak_bonus(&self, win_streak: u32) -> f64 {
        if win_streak == 0 {
            return 0.0;
        }
        (f64::from(win_streak) - 1.0).min(self.config.streak_bonus_cap).max(0.0)
    }

    pub fn on_spin(&self, heat: f64, payout: f64, win_streak: u32) -> f64 {
        self.on_spin_scaled(heat, payout, win_streak, 1.0)
    }

    /// `on_spin` with the gain multiplied by `scale` (machine and tier
    /// heat-gain modifiers).
    pub fn on_spin_scaled(&self, heat: f64, payout: f64, win_streak: u32, scale: f64) -> f64 {
        let base = if payout > 0.0 {
            self.config.win_gain
        } else {
            self.config.loss_gain
        };
        let gain = (base + self.streak_bonus(win_streak)) * scale.max(0.0);
        (heat + gain).max(0.0)
    }

    pub fn on_between_nodes(&self, heat: f64) -> f64 {
        (heat - self.config.between_nodes_decay).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> HeatSystem {
        HeatSystem::new(HeatThresholds::default(), HeatConfig::default())
    }

    #[test]
    fn streak_bonus_is_capped_and_never_negative() {
        let heat = system();
        assert_eq!(heat.streak_bonus(0), 0.0);
        assert_eq!(heat.streak_bonus(1), 0.0);
        assert_eq!(heat.streak_bonus(3), 2.0);
        assert_eq!(heat.streak_bonus(50), 3.0);
    }

    #[test]
    fn scale_multiplies_the_whole_gain() {
        let heat = system();
        assert_eq!(heat.on_spin_scaled(0.0, 5.0, 1, 2.0), 14.0);
        assert_eq!(heat.on_spin_scaled(0.0, 0.0, 0, 0.5), 0.5);
    }
}
