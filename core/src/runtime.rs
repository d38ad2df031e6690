//! Machine runtime builder.
//!
//! Weight merge order, each step floored at 0:
//!   1. inherit the default pool (or start from 0)
//!   2. relative deltas
//!   3. absolute pool overrides
//!   4. per-icon override weights
//!   5. exclusions (always win: an excluded icon stays at 0)

use crate::config::{
    Effect, HeatThresholds, IconMeta, MachineSpec, PatternDef, TierModifiers,
};
use crate::types::{IconId, Millis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveIconInfo {
    pub id: IconId,
    /// 0 ⇒ the icon never appears on a strip.
    pub weight: f64,
    pub base_mult: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineRuntime {
    pub id: String,
    pub name: String,
    pub grid_width: usize,
    pub grid_height: usize,
    pub reel_length: usize,
    pub spin_duration_ms: Millis,
    pub icons: BTreeMap<IconId, EffectiveIconInfo>,
    pub heat: HeatThresholds,
    pub base_heat_scalar: f64,
    pub tier_modifiers: TierModifiers,
    pub patterns: Vec<PatternDef>,
    pub theme_color: Option<String>,
}

impl MachineRuntime {
    /// Resolved weights in IconId order, the strip generator's input.
    pub fn weights(&self) -> BTreeMap<IconId, f64> {
        self.icons.iter().map(|(id, info)| (*id, info.weight)).collect()
    }

    pub fn base_mult(&self, id: IconId) -> f64 {
        self.icons.get(&id).map(|info| info.base_mult).unwrap_or(1.0)
    }
}

/// Merge the default pool and the machine's adjustments into a runtime.
/// Icons missing from `meta` are left out of the runtime entirely.
pub fn build_runtime(
    spec: &MachineSpec,
    meta: &[IconMeta],
    patterns: &[PatternDef],
) -> MachineRuntime {
    let defaults: BTreeMap<IconId, &IconMeta> = meta.iter().map(|m| (m.id, m)).collect();

    let mut weights: BTreeMap<IconId, f64> = IconId::ALL
        .iter()
        .map(|id| {
            let base = if spec.inherit_defaults {
                defaults
                    .get(id)
                    .map(|m| m.default_weight)
                    .or(spec.default_new_icon_weight)
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            (*id, base.max(0.0))
        })
        .collect();

    for (id, delta) in &spec.pool_adjustments.deltas {
        let w = weights.entry(*id).or_insert(0.0);
        *w = (*w + delta).max(0.0);
    }
    for (id, value) in &spec.pool_adjustments.overrides {
        weights.insert(*id, value.max(0.0));
    }
    for (id, ov) in &spec.icon_overrides {
        if let Some(w) = ov.weight {
            weights.insert(*id, w.max(0.0));
        }
    }
    for id in &spec.exclude {
        weights.insert(*id, 0.0);
    }

    let icons = IconId::ALL
        .iter()
        .filter_map(|id| {
            let m = defaults.get(id)?;
            let ov = spec.icon_overrides.get(id);
            let mut effects: Vec<Effect> = m.effects.clone();
            let mut base_mult = m.base_mult;
            if let Some(ov) = ov {
                effects.retain(|e| !ov.remove_effect_kinds.contains(&e.kind()));
                effects.extend(ov.add_effects.iter().cloned());
                if let Some(b) = ov.base_mult {
                    base_mult = b;
                }
            }
            Some((
                *id,
                EffectiveIconInfo {
                    id: *id,
                    weight: weights.get(id).copied().unwrap_or(0.0),
                    base_mult,
                    category: m.category.clone(),
                    tags: m.tags.clone(),
                    effects,
                },
            ))
        })
        .collect();

    let patterns = patterns
        .iter()
        .filter(|p| spec.pattern_ids.contains(&p.id))
        .cloned()
        .collect();

    log::debug!("Built runtime for machine {}", spec.id);

    MachineRuntime {
        id: spec.id.clone(),
        name: spec.name.clone(),
        grid_width: spec.grid_width,
        grid_height: spec.grid_height,
        reel_length: spec.reel_length,
        spin_duration_ms: spec.spin_duration_ms,
        icons,
        heat: spec.heat,
        base_heat_scalar: spec.base_heat_scalar,
        tier_modifiers: spec.tier_modifiers.clone(),
        patterns,
        theme_color: spec.theme_color.clone(),
    }
}
