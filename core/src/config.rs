use crate::types::{IconId, Millis, PatternKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ── Icons ───────────────────────────────────────────────────────────────────

/// When a data-driven effect fires. Carried for the host; the evaluator
/// never triggers effects itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectHook {
    OnSpin,
    OnWin,
    OnPattern,
    OnHeatStage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    AddMultiplier {
        hook: EffectHook,
        amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        applies_to: Option<String>,
    },
    AddPayout {
        hook: EffectHook,
        amount: f64,
    },
    BiasIcon {
        hook: EffectHook,
        target: IconId,
        weight_delta: f64,
    },
    AddHeat {
        hook: EffectHook,
        amount: f64,
    },
    ConvertIcon {
        hook: EffectHook,
        from: String,
        to: IconId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chance: Option<f64>,
    },
    Custom {
        hook: EffectHook,
        payload: serde_json::Value,
    },
}

/// Discriminant of `Effect`, used by overrides that strip whole kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    AddMultiplier,
    AddPayout,
    BiasIcon,
    AddHeat,
    ConvertIcon,
    Custom,
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::AddMultiplier { .. } => EffectKind::AddMultiplier,
            Self::AddPayout { .. }     => EffectKind::AddPayout,
            Self::BiasIcon { .. }      => EffectKind::BiasIcon,
            Self::AddHeat { .. }       => EffectKind::AddHeat,
            Self::ConvertIcon { .. }   => EffectKind::ConvertIcon,
            Self::Custom { .. }        => EffectKind::Custom,
        }
    }

    pub fn hook(&self) -> EffectHook {
        match self {
            Self::AddMultiplier { hook, .. }
            | Self::AddPayout { hook, .. }
            | Self::BiasIcon { hook, .. }
            | Self::AddHeat { hook, .. }
            | Self::ConvertIcon { hook, .. }
            | Self::Custom { hook, .. } => *hook,
        }
    }
}

/// One row of `icons.json`. `default_weight` is the global default pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconMeta {
    pub id: IconId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub base_mult: f64,
    pub default_weight: f64,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDef {
    pub id: String,
    pub name: String,
    pub family: PatternKind,
}

// ── Machines ────────────────────────────────────────────────────────────────

/// Which icons an icon-scoped modifier touches. At least one field is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<IconId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<PatternKind>,
}

/// Heat-tier bonus/penalty entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modifier {
    IconBaseDelta { target: IconTarget, delta: f64 },
    IconWeightDelta { target: IconTarget, delta: f64 },
    /// Shift by percentage points of the icon's current weight.
    IconWeightPercentageDelta { target: IconTarget, pp_delta: f64 },
    PatternMultiplier { target: PatternTarget, new_mult: f64 },
    /// Flat percentage of the evaluated payout added on top (10 ⇒ +10%).
    BasePayoutPercentage { flat: f64 },
    HeatGainScale {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        family: Option<PatternKind>,
        scale: f64,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolAdjustments {
    /// Absolute weights, applied after deltas.
    #[serde(default)]
    pub overrides: BTreeMap<IconId, f64>,
    #[serde(default)]
    pub deltas: BTreeMap<IconId, f64>,
}

/// Per-machine tweaks to a single icon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IconOverride {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub base_mult: Option<f64>,
    #[serde(default)]
    pub add_effects: Vec<Effect>,
    #[serde(default)]
    pub remove_effect_kinds: Vec<EffectKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatThresholds {
    pub warm_up: f64,
    pub on_fire: f64,
    pub burning_up: f64,
    pub breakdown: f64,
}

impl Default for HeatThresholds {
    fn default() -> Self {
        Self {
            warm_up: 10.0,
            on_fire: 33.0,
            burning_up: 66.0,
            breakdown: 100.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierModifiers {
    #[serde(default)]
    pub warmed_up_bonus: Vec<Modifier>,
    #[serde(default)]
    pub on_fire_bonus: Vec<Modifier>,
    #[serde(default)]
    pub burning_up_bonus: Vec<Modifier>,
    #[serde(default)]
    pub burning_up_penalty: Vec<Modifier>,
    #[serde(default)]
    pub breakdown_bonus: Vec<Modifier>,
    #[serde(default)]
    pub breakdown_penalty: Vec<Modifier>,
}

/// One validated entry of `machines.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSpec {
    pub id: String,
    pub name: String,
    pub grid_width: usize,
    pub grid_height: usize,
    pub reel_length: usize,
    #[serde(default = "default_spin_duration_ms")]
    pub spin_duration_ms: Millis,
    pub inherit_defaults: bool,
    /// Weight for inherited icons whose default pool entry is missing.
    #[serde(default)]
    pub default_new_icon_weight: Option<f64>,
    #[serde(default)]
    pub pool_adjustments: PoolAdjustments,
    #[serde(default)]
    pub exclude: Vec<IconId>,
    #[serde(default)]
    pub icon_overrides: BTreeMap<IconId, IconOverride>,
    pub heat: HeatThresholds,
    /// Global multiplier on heat gained per spin.
    pub base_heat_scalar: f64,
    #[serde(default)]
    pub tier_modifiers: TierModifiers,
    pub pattern_ids: Vec<String>,
    #[serde(default)]
    pub theme_color: Option<String>,
}

fn default_spin_duration_ms() -> Millis {
    4_000.0
}

// ── Motion / heat / progression tuning ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopProfileConfig {
    /// Distance over which velocity decays to `min_speed`.
    pub decel_distance_px: f64,
    /// Floor speed (px/ms) the reel crawls at until it reaches a boundary.
    pub min_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReelMotionConfig {
    pub cell_size_px: f64,
    /// Free-spin velocity in px/ms.
    pub spin_speed: f64,
    pub manual_stop: StopProfileConfig,
    pub forced_stop: StopProfileConfig,
    pub snap_epsilon_px: f64,
}

impl Default for ReelMotionConfig {
    fn default() -> Self {
        Self {
            cell_size_px: 96.0,
            spin_speed: 1.5,
            manual_stop: StopProfileConfig {
                decel_distance_px: 480.0,
                min_speed: 0.12,
            },
            forced_stop: StopProfileConfig {
                decel_distance_px: 192.0,
                min_speed: 0.24,
            },
            snap_epsilon_px: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatConfig {
    pub win_gain: f64,
    pub loss_gain: f64,
    pub streak_bonus_cap: f64,
    pub between_nodes_decay: f64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            win_gain: 7.0,
            loss_gain: 1.0,
            streak_bonus_cap: 3.0,
            between_nodes_decay: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundMode {
    Safe,
    Risky,
}

impl RoundMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe  => "Safe (6 spins, 1.0x)",
            Self::Risky => "Risky (3 spins, 2.0x)",
        }
    }

    pub fn spins_allowed(&self) -> u32 {
        match self {
            Self::Safe  => 6,
            Self::Risky => 3,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Safe  => 1.0,
            Self::Risky => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub mode: RoundMode,
    pub spins_allowed: u32,
    pub multiplier: f64,
    /// `None` means every round succeeds.
    #[serde(default)]
    pub target_credits: Option<f64>,
}

impl RoundConfig {
    /// Spin budget and multiplier taken from the mode preset.
    pub fn preset(mode: RoundMode, target_credits: Option<f64>) -> Self {
        Self {
            mode,
            spins_allowed: mode.spins_allowed(),
            multiplier: mode.multiplier(),
            target_credits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightConfig {
    pub rounds: u32,
    pub round: RoundConfig,
}

impl Default for FightConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            round: RoundConfig::preset(RoundMode::Safe, Some(10.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Node index at which the run ends.
    pub path_length: u32,
    pub shop_heat_reduction: f64,
    pub shop_heal: f64,
    pub shop_action_cost: u32,
    pub starting_health: f64,
    pub enemy_base_hp: f64,
    /// Extra hp for each enemy tier above the first.
    pub enemy_hp_per_tier: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            path_length: 3,
            shop_heat_reduction: 25.0,
            shop_heal: 20.0,
            shop_action_cost: 1,
            starting_health: 100.0,
            enemy_base_hp: 100.0,
            enemy_hp_per_tier: 50.0,
        }
    }
}

// ── File shapes ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct IconsFile {
    icons: Vec<IconMeta>,
}

#[derive(Deserialize)]
struct PatternsFile {
    patterns: Vec<PatternDef>,
}

#[derive(Deserialize)]
struct MachinesFile {
    machines: Vec<serde_json::Value>,
}

#[derive(Deserialize, Default)]
struct TuningFile {
    #[serde(default)]
    motion: ReelMotionConfig,
    #[serde(default)]
    heat: HeatConfig,
    #[serde(default)]
    fight: FightConfig,
    #[serde(default)]
    run: RunConfig,
}

#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub icons: Vec<IconMeta>,
    pub patterns: Vec<PatternDef>,
    pub machines: Vec<MachineSpec>,
    pub motion: ReelMotionConfig,
    pub heat: HeatConfig,
    pub fight: FightConfig,
    pub run: RunConfig,
}

impl SlotConfig {
    /// Load from the data/ directory.
    /// In tests, use SlotConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let icon_path = format!("{data_dir}/icons.json");
        let icon_content = std::fs::read_to_string(&icon_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {icon_path}: {e}"))?;
        let icon_file: IconsFile = serde_json::from_str(&icon_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {icon_path}: {e}"))?;
        for icon in &icon_file.icons {
            if !(icon.base_mult > 0.0) {
                anyhow::bail!("{icon_path}: icon \"{}\" must have a positive base_mult", icon.id);
            }
            if !(icon.default_weight >= 0.0) {
                anyhow::bail!(
                    "{icon_path}: icon \"{}\" must have a non-negative default_weight",
                    icon.id
                );
            }
        }

        let pattern_path = format!("{data_dir}/patterns.json");
        let pattern_content = std::fs::read_to_string(&pattern_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {pattern_path}: {e}"))?;
        let pattern_file: PatternsFile = serde_json::from_str(&pattern_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {pattern_path}: {e}"))?;
        let pattern_ids: BTreeSet<String> =
            pattern_file.patterns.iter().map(|p| p.id.clone()).collect();

        let machine_path = format!("{data_dir}/machines.json");
        let machine_content = std::fs::read_to_string(&machine_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {machine_path}: {e}"))?;
        let machine_file: MachinesFile = serde_json::from_str(&machine_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {machine_path}: {e}"))?;

        let mut machines = Vec::new();
        let mut errors = Vec::new();
        for (index, candidate) in machine_file.machines.iter().enumerate() {
            match crate::validation::validate_machine(candidate, &pattern_ids) {
                Ok(spec) => machines.push(spec),
                Err(msg) => errors.push(format!("#{index}: {msg}")),
            }
        }
        if !errors.is_empty() {
            anyhow::bail!("Machine config errors in {machine_path}:\n{}", errors.join("\n"));
        }

        // Tuning is optional; every section falls back to its defaults.
        let tuning_path = format!("{data_dir}/tuning.json");
        let tuning: TuningFile = if std::path::Path::new(&tuning_path).exists() {
            let content = std::fs::read_to_string(&tuning_path)
                .map_err(|e| anyhow::anyhow!("Cannot read {tuning_path}: {e}"))?;
            serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {tuning_path}: {e}"))?
        } else {
            TuningFile::default()
        };

        log::info!(
            "Loaded {} icons, {} patterns, {} machines from {data_dir}",
            icon_file.icons.len(),
            pattern_file.patterns.len(),
            machines.len()
        );

        Ok(Self {
            icons: icon_file.icons,
            patterns: pattern_file.patterns,
            machines,
            motion: tuning.motion,
            heat: tuning.heat,
            fight: tuning.fight,
            run: tuning.run,
        })
    }

    pub fn machine(&self, id: &str) -> Option<&MachineSpec> {
        self.machines.iter().find(|m| m.id == id)
    }

    pub fn pattern_ids(&self) -> BTreeSet<String> {
        self.patterns.iter().map(|p| p.id.clone()).collect()
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let icon = |id: IconId, category: &str, tags: &[&str], base_mult: f64, weight: f64| {
            IconMeta {
                id,
                name: id.as_str().to_string(),
                category: category.into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                base_mult,
                default_weight: weight,
                effects: Vec::new(),
            }
        };
        let icons = vec![
            icon(IconId::Lemon, "fruit", &["sour"], 1.0, 30.0),
            icon(IconId::Grape, "fruit", &["sweet"], 1.0, 25.0),
            icon(IconId::Melon, "fruit", &["sweet"], 1.5, 20.0),
            icon(IconId::Cherry, "fruit", &["sweet", "lucky"], 2.0, 15.0),
            icon(IconId::Diamond, "gem", &["shiny"], 5.0, 4.0),
            icon(IconId::Bar, "classic", &[], 2.5, 10.0),
            icon(IconId::Seven, "classic", &["lucky"], 7.0, 3.0),
            icon(IconId::Bell, "classic", &[], 3.0, 8.0),
            icon(IconId::Star, "gem", &["shiny", "lucky"], 4.0, 5.0),
        ];

        let patterns = vec![
            PatternDef { id: "rows".into(), name: "Rows".into(), family: PatternKind::Horizontal },
            PatternDef { id: "columns".into(), name: "Columns".into(), family: PatternKind::Vertical },
            PatternDef { id: "diagonals".into(), name: "Diagonals".into(), family: PatternKind::Diagonal },
        ];

        let machine = MachineSpec {
            id: "test_machine".into(),
            name: "Test Machine".into(),
            grid_width: 3,
            grid_height: 3,
            reel_length: 12,
            spin_duration_ms: default_spin_duration_ms(),
            inherit_defaults: true,
            default_new_icon_weight: None,
            pool_adjustments: PoolAdjustments::default(),
            exclude: Vec::new(),
            icon_overrides: BTreeMap::new(),
            heat: HeatThresholds::default(),
            base_heat_scalar: 1.0,
            tier_modifiers: TierModifiers::default(),
            pattern_ids: vec!["rows".into(), "columns".into(), "diagonals".into()],
            theme_color: None,
        };

        Self {
            icons,
            patterns,
            machines: vec![machine],
            motion: ReelMotionConfig::default(),
            heat: HeatConfig::default(),
            fight: FightConfig::default(),
            run: RunConfig::default(),
        }
    }
}
