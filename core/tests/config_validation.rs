use serde_json::{json, Value};
use slotspire_core::{
    config::{EffectKind, SlotConfig},
    runtime::build_runtime,
    types::IconId,
    validation::validate_machine,
};
use std::collections::BTreeSet;

// ── Test helpers ────────────────────────────────────────────────────────────

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");

fn patterns() -> BTreeSet<String> {
    ["rows", "columns", "diagonals"].iter().map(|s| s.to_string()).collect()
}

fn valid_machine() -> Value {
    json!({
        "id": "probe",
        "name": "Probe",
        "grid_width": 3,
        "grid_height": 3,
        "reel_length": 12,
        "inherit_defaults": true,
        "heat": { "warm_up": 10, "on_fire": 33, "burning_up": 66, "breakdown": 100 },
        "base_heat_scalar": 1.0,
        "pattern_ids": ["rows", "columns"]
    })
}

/// Apply `edit` to a valid machine and return the validation error.
fn error_for(edit: impl FnOnce(&mut Value)) -> String {
    let mut machine = valid_machine();
    edit(&mut machine);
    validate_machine(&machine, &patterns()).expect_err("machine should be rejected")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn bundled_data_loads() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = SlotConfig::load(DATA_DIR).expect("bundled data is valid");
    assert_eq!(config.icons.len(), IconId::ALL.len());
    assert!(config.machine("classic").is_some());
    assert!(config.machine("orchard").is_some());
    assert!(config.machine("vault").is_some());
    assert!(config.machine("missing").is_none());
    assert_eq!(config.pattern_ids(), patterns());
}

#[test]
fn minimal_machine_gets_defaults() {
    let spec = validate_machine(&valid_machine(), &patterns()).unwrap();
    assert_eq!(spec.spin_duration_ms, 4_000.0);
    assert!(spec.exclude.is_empty());
    assert!(spec.theme_color.is_none());
    assert!(spec.tier_modifiers.on_fire_bonus.is_empty());
}

#[test]
fn missing_id_is_reported_first() {
    let err = validate_machine(&json!({ "name": "nameless" }), &patterns()).unwrap_err();
    assert_eq!(err, "Machine config must include a string id");
    let err = validate_machine(&json!([1, 2]), &patterns()).unwrap_err();
    assert_eq!(err, "Machine config must be an object");
}

#[test]
fn grid_and_reel_sizes_are_checked() {
    let err = error_for(|m| m["grid_width"] = json!(0));
    assert_eq!(err, "Machine probe: grid_width must be a positive integer");
    let err = error_for(|m| m["grid_height"] = json!(2.5));
    assert_eq!(err, "Machine probe: grid_height must be a positive integer");
    let err = error_for(|m| m["reel_length"] = json!(2));
    assert!(err.contains("reel_length must be a positive integer at least as large as grid_height"));
}

#[test]
fn heat_thresholds_must_ascend() {
    let err = error_for(|m| m["heat"]["on_fire"] = json!(5));
    assert_eq!(err, "Machine probe: heat.on_fire must be greater than heat.warm_up");
    let err = error_for(|m| m["heat"]["breakdown"] = json!(66));
    assert_eq!(err, "Machine probe: heat.breakdown must be greater than heat.burning_up");
    let err = error_for(|m| m["heat"] = json!(7));
    assert!(err.ends_with("heat must be an object of tier thresholds"));
}

#[test]
fn references_must_resolve() {
    let err = error_for(|m| m["pattern_ids"] = json!(["rows", "spirals"]));
    assert_eq!(
        err,
        "Machine probe: pattern_ids[1] \"spirals\" is not defined in the pattern table"
    );
    let err = error_for(|m| m["exclude"] = json!(["lemon", "banana"]));
    assert_eq!(err, "Machine probe: exclude[1] \"banana\" is not a recognised icon id");
    let err = error_for(|m| m["pool_adjustments"] = json!({ "deltas": { "kiwi": 2 } }));
    assert_eq!(err, "Machine probe: pool_adjustments.deltas uses unknown icon id \"kiwi\"");
    let err = error_for(|m| m["pool_adjustments"] = json!({ "overrides": { "lemon": -1 } }));
    assert!(err.contains("must be non-negative"));
    let err = error_for(|m| m["icon_overrides"] = json!({ "plum": {} }));
    assert!(err.contains("unknown icon id \"plum\""));
}

#[test]
fn modifiers_are_checked() {
    let err = error_for(|m| {
        m["tier_modifiers"] = json!({ "on_fire_bonus": [{ "type": "teleport" }] })
    });
    assert_eq!(err, "Machine probe: on_fire_bonus[0]: unsupported modifier type \"teleport\"");

    let err = error_for(|m| {
        m["tier_modifiers"] =
            json!({ "warmed_up_bonus": [{ "type": "icon_base_delta", "target": {}, "delta": 1 }] })
    });
    assert!(err.ends_with("target must include icon_id or tag"), "{err}");

    let err = error_for(|m| {
        m["tier_modifiers"] =
            json!({ "breakdown_bonus": [{ "type": "base_payout_percentage", "flat": 0 }] })
    });
    assert!(err.ends_with("flat must be a positive number"), "{err}");

    let err = error_for(|m| {
        m["tier_modifiers"] = json!({
            "burning_up_penalty": [{ "type": "heat_gain_scale", "family": "spiral", "scale": 2 }]
        })
    });
    assert!(err.contains("is not a known pattern family"), "{err}");

    let err = error_for(|m| m["tier_modifiers"] = json!({ "lukewarm_bonus": [] }));
    assert!(err.contains("tier_modifiers.lukewarm_bonus is not a known modifier list"));
}

#[test]
fn theme_color_must_be_hex() {
    let err = error_for(|m| m["theme_color"] = json!("gold"));
    assert_eq!(err, "Machine probe: theme_color must be a valid hex color string");
    let mut ok = valid_machine();
    ok["theme_color"] = json!("#abc");
    assert!(validate_machine(&ok, &patterns()).is_ok());
}

/// Every bad machine in a file is reported, each with its index.
#[test]
fn load_collects_every_machine_error() {
    let dir = std::env::temp_dir().join(format!("slotspire-config-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    for file in ["icons.json", "patterns.json"] {
        std::fs::copy(format!("{DATA_DIR}/{file}"), dir.join(file)).unwrap();
    }
    let mut bad_grid = valid_machine();
    bad_grid["grid_width"] = json!(-1);
    let mut bad_heat = valid_machine();
    bad_heat["id"] = json!("second");
    bad_heat["base_heat_scalar"] = json!(0);
    let machines = json!({ "machines": [valid_machine(), bad_grid, bad_heat] });
    std::fs::write(dir.join("machines.json"), machines.to_string()).unwrap();

    let err = SlotConfig::load(dir.to_str().unwrap()).unwrap_err().to_string();
    assert!(err.contains("#1: Machine probe: grid_width must be a positive integer"), "{err}");
    assert!(err.contains("#2: Machine second: base_heat_scalar must be a positive number"), "{err}");
    assert!(!err.contains("#0"));

    // Without tuning.json every tuning section uses its defaults.
    std::fs::write(dir.join("machines.json"), json!({ "machines": [valid_machine()] }).to_string())
        .unwrap();
    let config = SlotConfig::load(dir.to_str().unwrap()).unwrap();
    assert_eq!(config.motion, slotspire_core::config::ReelMotionConfig::default());
    assert_eq!(config.fight.rounds, 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_data_dir_names_the_file() {
    let err = SlotConfig::load("/definitely/not/here").unwrap_err().to_string();
    assert!(err.contains("icons.json"), "{err}");
}

// ── Runtime merge ────────────────────────────────────────────────────────────

/// Orchard: deltas, then overrides, then exclusions. Seven is excluded
/// and stays at weight 0.
#[test]
fn orchard_runtime_merges_pool_adjustments() {
    let config = SlotConfig::load(DATA_DIR).unwrap();
    let spec = config.machine("orchard").unwrap();
    let runtime = build_runtime(spec, &config.icons, &config.patterns);

    let weight = |id: IconId| runtime.icons[&id].weight;
    assert_eq!(weight(IconId::Cherry), 25.0);
    assert_eq!(weight(IconId::Grape), 20.0);
    assert_eq!(weight(IconId::Melon), 12.0);
    assert_eq!(weight(IconId::Seven), 0.0);
    assert_eq!(weight(IconId::Lemon), 30.0);

    let cherry = &runtime.icons[&IconId::Cherry];
    assert_eq!(cherry.base_mult, 2.5);
    assert!(cherry.effects.iter().all(|e| e.kind() != EffectKind::AddPayout));
    assert_eq!(runtime.theme_color.as_deref(), Some("#3a7d44"));
    assert_eq!(runtime.patterns.len(), 3);
}

/// Without inheritance only explicitly weighted icons appear.
#[test]
fn vault_runtime_starts_from_zero() {
    let config = SlotConfig::load(DATA_DIR).unwrap();
    let runtime = build_runtime(config.machine("vault").unwrap(), &config.icons, &config.patterns);
    let live: Vec<IconId> = runtime
        .weights()
        .into_iter()
        .filter(|(_, w)| *w > 0.0)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(
        live,
        vec![IconId::Diamond, IconId::Bar, IconId::Seven, IconId::Bell, IconId::Star]
    );
}

#[test]
fn exclusion_beats_an_override_weight() {
    let mut config = SlotConfig::default_test();
    let spec = &mut config.machines[0];
    spec.exclude = vec![IconId::Bell];
    spec.pool_adjustments.overrides.insert(IconId::Bell, 50.0);
    spec.icon_overrides.insert(
        IconId::Bell,
        slotspire_core::config::IconOverride { weight: Some(40.0), ..Default::default() },
    );
    let runtime = build_runtime(&config.machines[0], &config.icons, &config.patterns);
    assert_eq!(runtime.icons[&IconId::Bell].weight, 0.0);
}

#[test]
fn deltas_floor_at_zero() {
    let mut config = SlotConfig::default_test();
    config.machines[0].pool_adjustments.deltas.insert(IconId::Seven, -100.0);
    let runtime = build_runtime(&config.machines[0], &config.icons, &config.patterns);
    assert_eq!(runtime.icons[&IconId::Seven].weight, 0.0);
}
