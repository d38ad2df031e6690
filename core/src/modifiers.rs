//! Heat-tier modifiers.
//!
//! Icon modifiers reshape a copy of the runtime (weights, base multipliers)
//! when the machine enters a tier. Payout and heat modifiers are collected
//! into `TierEffects` and applied to each evaluated spin.

use crate::config::{IconTarget, Modifier, PatternDef, PatternTarget, TierModifiers};
use crate::evaluator::{Evaluation, PayoutComponent};
use crate::heat::HeatTier;
use crate::runtime::{EffectiveIconInfo, MachineRuntime};
use crate::types::PatternKind;
use std::collections::BTreeMap;

/// Base multipliers never drop below this, whatever the deltas say.
pub const MIN_BASE_MULT: f64 = 0.1;

/// Modifier lists active in a tier, bonuses before penalties.
pub fn modifiers_for_tier(table: &TierModifiers, tier: HeatTier) -> Vec<&Modifier> {
    let lists: Vec<&Vec<Modifier>> = match tier {
        HeatTier::Cold => Vec::new(),
        HeatTier::WarmedUp => vec![&table.warmed_up_bonus],
        HeatTier::OnFire => vec![&table.on_fire_bonus],
        HeatTier::BurningUp => vec![&table.burning_up_bonus, &table.burning_up_penalty],
        HeatTier::Breakdown => vec![&table.breakdown_bonus, &table.breakdown_penalty],
    };
    lists.into_iter().flatten().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierEffects {
    pub tier: HeatTier,
    /// Percentage of the evaluated payout added on top.
    pub payout_bonus_pct: f64,
    pub pattern_multipliers: Vec<(PatternTarget, f64)>,
    /// Heat gain scale applied to every spin.
    pub heat_gain_scale: f64,
    /// Extra scale applied when the spin paid on that family.
    pub family_heat_scales: BTreeMap<PatternKind, f64>,
}

impl TierEffects {
    pub fn neutral(tier: HeatTier) -> Self {
        Self {
            tier,
            payout_bonus_pct: 0.0,
            pattern_multipliers: Vec::new(),
            heat_gain_scale: 1.0,
            family_heat_scales: BTreeMap::new(),
        }
    }

    /// Rescale matching patterns, then add the flat percentage bonus. Each
    /// adjustment appears as its own payout component.
    pub fn apply(&self, eval: &mut Evaluation, patterns: &[PatternDef]) {
        if eval.patterns.is_empty() {
            return;
        }
        for (target, new_mult) in &self.pattern_multipliers {
            let Some(family) = target_family(target, patterns) else {
                continue;
            };
            let mut extra = 0.0;
            for win in eval.patterns.iter_mut().filter(|w| w.kind == family) {
                let scaled = win.multiplier * new_mult;
                extra += scaled - win.multiplier;
                win.multiplier = scaled;
            }
            if extra != 0.0 {
                eval.payout += extra;
                eval.components.push(PayoutComponent {
                    description: format!("{} pattern multiplier x{new_mult}", family.as_str()),
                    amount: extra,
                });
            }
        }
        if self.payout_bonus_pct > 0.0 {
            let bonus = eval.payout * self.payout_bonus_pct / 100.0;
            eval.payout += bonus;
            eval.components.push(PayoutComponent {
                description: format!("{} payout bonus +{}%", self.tier, self.payout_bonus_pct),
                amount: bonus,
            });
        }
    }

    /// Combined heat gain scale for a spin that paid on `families`.
    pub fn heat_scale_for(&self, families: &[PatternKind]) -> f64 {
        let mut scale = self.heat_gain_scale;
        for (family, s) in &self.family_heat_scales {
            if families.contains(family) {
                scale *= s;
            }
        }
        scale
    }
}

fn target_family(target: &PatternTarget, patterns: &[PatternDef]) -> Option<PatternKind> {
    if let Some(family) = target.family {
        return Some(family);
    }
    let id = target.pattern_id.as_ref()?;
    patterns.iter().find(|p| &p.id == id).map(|p| p.family)
}

fn matches(target: &IconTarget, info: &EffectiveIconInfo) -> bool {
    let by_id = target.icon_id.is_some_and(|id| id == info.id);
    let by_tag = target
        .tag
        .as_ref()
        .is_some_and(|tag| info.tags.iter().any(|t| t == tag));
    by_id || by_tag
}

/// Apply a tier's modifiers on top of `base`. Weight modifiers skip icons
/// already at weight 0 so exclusions survive every tier.
pub fn apply_tier(base: &MachineRuntime, tier: HeatTier) -> (MachineRuntime, TierEffects) {
    let mut runtime = base.clone();
    let mut effects = TierEffects::neutral(tier);

    for modifier in modifiers_for_tier(&base.tier_modifiers, tier) {
        match modifier {
            Modifier::IconBaseDelta { target, delta } => {
                for info in runtime.icons.values_mut().filter(|i| matches(target, i)) {
                    info.base_mult = (info.base_mult + delta).max(MIN_BASE_MULT);
                }
            }
            Modifier::IconWeightDelta { target, delta } => {
                for info in runtime
                    .icons
                    .values_mut()
                    .filter(|i| i.weight > 0.0 && matches(target, i))
                {
                    info.weight = (info.weight + delta).max(0.0);
                }
            }
            Modifier::IconWeightPercentageDelta { target, pp_delta } => {
                for info in runtime
                    .icons
                    .values_mut()
                    .filter(|i| i.weight > 0.0 && matches(target, i))
                {
                    info.weight = (info.weight * (1.0 + pp_delta / 100.0)).max(0.0);
                }
            }
            Modifier::PatternMultiplier { target, new_mult } => {
                effects.pattern_multipliers.push((target.clone(), *new_mult));
            }
            Modifier::BasePayoutPercentage { flat } => {
                effects.payout_bonus_pct += flat;
            }
            Modifier::HeatGainScale { family: None, scale } => {
                effects.heat_gain_scale *= scale;
            }
            Modifier::HeatGainScale { family: Some(family), scale } => {
                *effects.family_heat_scales.entry(*family).or_insert(1.0) *= scale;
            }
        }
    }

    log::debug!("Machine {} entered tier {tier}", base.id);
    (runtime, effects)
}
