//! Structural validation of raw machine entries.
//!
//! Runs on the untyped JSON value so a bad entry produces a message naming
//! the offending field instead of a generic deserialisation error. Only a
//! value that passes every check is converted into a `MachineSpec`.

use crate::config::MachineSpec;
use crate::types::{IconId, PatternKind};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

type Obj = Map<String, Value>;

pub fn validate_machine(
    value: &Value,
    known_patterns: &BTreeSet<String>,
) -> Result<MachineSpec, String> {
    let m = value
        .as_object()
        .ok_or_else(|| "Machine config must be an object".to_string())?;

    let id = m
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| "Machine config must include a string id".to_string())?;

    check_machine(m, known_patterns).map_err(|e| format!("Machine {id}: {e}"))?;

    serde_json::from_value(value.clone()).map_err(|e| format!("Machine {id}: {e}"))
}

fn check_machine(m: &Obj, known_patterns: &BTreeSet<String>) -> Result<(), String> {
    if !m.get("name").is_some_and(Value::is_string) {
        return Err("name must be a string".into());
    }
    positive_integer(m, "grid_width")?;
    let grid_height = positive_integer(m, "grid_height")?;
    let reel_length = positive_integer(m, "reel_length").ok();
    if !reel_length.is_some_and(|len| len >= grid_height) {
        return Err(
            "reel_length must be a positive integer at least as large as grid_height".into(),
        );
    }
    if let Some(duration) = m.get("spin_duration_ms") {
        if !duration.as_f64().is_some_and(|d| d.is_finite() && d > 0.0) {
            return Err("spin_duration_ms must be a positive number".into());
        }
    }
    if !m.get("inherit_defaults").is_some_and(Value::is_boolean) {
        return Err("inherit_defaults must be a boolean".into());
    }
    if let Some(weight) = m.get("default_new_icon_weight") {
        if !weight.as_f64().is_some_and(|w| w.is_finite() && w >= 0.0) {
            return Err("default_new_icon_weight must be a non-negative number".into());
        }
    }

    check_heat(m)?;

    if !m
        .get("base_heat_scalar")
        .and_then(Value::as_f64)
        .is_some_and(|s| s.is_finite() && s > 0.0)
    {
        return Err("base_heat_scalar must be a positive number".into());
    }

    let pattern_ids = m
        .get("pattern_ids")
        .and_then(Value::as_array)
        .ok_or_else(|| "pattern_ids must be an array".to_string())?;
    for (i, pattern) in pattern_ids.iter().enumerate() {
        let pattern = pattern
            .as_str()
            .ok_or_else(|| format!("pattern_ids[{i}] must be a string"))?;
        if !known_patterns.is_empty() && !known_patterns.contains(pattern) {
            return Err(format!(
                "pattern_ids[{i}] \"{pattern}\" is not defined in the pattern table"
            ));
        }
    }

    if let Some(exclude) = m.get("exclude") {
        let exclude = exclude
            .as_array()
            .ok_or_else(|| "exclude must be an array".to_string())?;
        for (i, icon) in exclude.iter().enumerate() {
            if !icon.as_str().is_some_and(is_icon) {
                return Err(format!("exclude[{i}] {icon} is not a recognised icon id"));
            }
        }
    }

    if let Some(pool) = m.get("pool_adjustments") {
        let pool = pool
            .as_object()
            .ok_or_else(|| "pool_adjustments must be an object".to_string())?;
        if let Some(overrides) = pool.get("overrides") {
            icon_number_map(overrides, "pool_adjustments.overrides", true)?;
        }
        if let Some(deltas) = pool.get("deltas") {
            icon_number_map(deltas, "pool_adjustments.deltas", false)?;
        }
    }

    if let Some(overrides) = m.get("icon_overrides") {
        check_icon_overrides(overrides)?;
    }

    if let Some(tiers) = m.get("tier_modifiers") {
        let tiers = tiers
            .as_object()
            .ok_or_else(|| "tier_modifiers must be an object".to_string())?;
        for (label, list) in tiers {
            if !TIER_LISTS.contains(&label.as_str()) {
                return Err(format!("tier_modifiers.{label} is not a known modifier list"));
            }
            let list = list
                .as_array()
                .ok_or_else(|| format!("tier_modifiers.{label} must be an array"))?;
            for (i, modifier) in list.iter().enumerate() {
                check_modifier(modifier, &format!("{label}[{i}]"), known_patterns)?;
            }
        }
    }

    if let Some(color) = m.get("theme_color") {
        if !color.as_str().is_some_and(is_hex_color) {
            return Err("theme_color must be a valid hex color string".into());
        }
    }

    Ok(())
}

const TIER_LISTS: [&str; 6] = [
    "warmed_up_bonus",
    "on_fire_bonus",
    "burning_up_bonus",
    "burning_up_penalty",
    "breakdown_bonus",
    "breakdown_penalty",
];

fn check_heat(m: &Obj) -> Result<(), String> {
    let heat = m
        .get("heat")
        .and_then(Value::as_object)
        .ok_or_else(|| "heat must be an object of tier thresholds".to_string())?;
    let number = |key: &str| heat.get(key).and_then(Value::as_f64).filter(|v| v.is_finite());

    let warm_up = number("warm_up")
        .filter(|v| *v >= 0.0)
        .ok_or_else(|| "heat.warm_up must be a non-negative number".to_string())?;
    let on_fire = number("on_fire")
        .filter(|v| *v > 0.0)
        .ok_or_else(|| "heat.on_fire must be a positive number".to_string())?;
    if on_fire <= warm_up {
        return Err("heat.on_fire must be greater than heat.warm_up".into());
    }
    let burning_up = number("burning_up")
        .ok_or_else(|| "heat.burning_up must be a number".to_string())?;
    if burning_up <= on_fire {
        return Err("heat.burning_up must be greater than heat.on_fire".into());
    }
    let breakdown = number("breakdown")
        .ok_or_else(|| "heat.breakdown must be a number".to_string())?;
    if breakdown <= burning_up {
        return Err("heat.breakdown must be greater than heat.burning_up".into());
    }
    Ok(())
}

fn check_icon_overrides(value: &Value) -> Result<(), String> {
    let overrides = value.as_object().ok_or_else(|| {
        "icon_overrides must be an object whose keys are icon ids".to_string()
    })?;
    for (key, ov) in overrides {
        if !is_icon(key) {
            return Err(format!("icon_overrides uses unknown icon id \"{key}\""));
        }
        let ov = ov
            .as_object()
            .ok_or_else(|| format!("icon_overrides[\"{key}\"] must be an object"))?;
        if let Some(weight) = ov.get("weight") {
            if !weight.as_f64().is_some_and(|w| w.is_finite() && w >= 0.0) {
                return Err(format!(
                    "icon_overrides[\"{key}\"].weight must be a non-negative number"
                ));
            }
        }
        if let Some(base) = ov.get("base_mult") {
            if !base.as_f64().is_some_and(|b| b.is_finite() && b > 0.0) {
                return Err(format!(
                    "icon_overrides[\"{key}\"].base_mult must be a positive number"
                ));
            }
        }
    }
    Ok(())
}

fn check_modifier(
    value: &Value,
    path: &str,
    known_patterns: &BTreeSet<String>,
) -> Result<(), String> {
    let modifier = value
        .as_object()
        .filter(|o| o.get("type").is_some_and(Value::is_string))
        .ok_or_else(|| format!("{path} must be an object with a string \"type\""))?;
    let kind = modifier.get("type").and_then(Value::as_str).unwrap_or_default();
    let finite = |key: &str| {
        modifier
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    };

    match kind {
        "icon_base_delta" | "icon_weight_delta" | "icon_weight_percentage_delta" => {
            let target = modifier
                .get("target")
                .and_then(Value::as_object)
                .ok_or_else(|| format!("{path}: target must be an object with icon_id and/or tag"))?;
            let icon_id = target.get("icon_id");
            let tag = target.get("tag");
            if icon_id.is_none() && tag.is_none() {
                return Err(format!("{path}: target must include icon_id or tag"));
            }
            if let Some(icon) = icon_id {
                if !icon.as_str().is_some_and(is_icon) {
                    return Err(format!("{path}: target.icon_id {icon} is not recognised"));
                }
            }
            if tag.is_some_and(|t| !t.is_string()) {
                return Err(format!("{path}: target.tag must be a string"));
            }
            let key = if kind == "icon_weight_percentage_delta" { "pp_delta" } else { "delta" };
            if finite(key).is_none() {
                return Err(format!("{path}: {key} must be a finite number"));
            }
        }
        "pattern_multiplier" => {
            let empty = Obj::new();
            let target = modifier
                .get("target")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            let pattern_id = target.get("pattern_id");
            let family = target.get("family");
            if pattern_id.is_none() && family.is_none() {
                return Err(format!("{path}: target must include pattern_id or family"));
            }
            if let Some(pattern_id) = pattern_id {
                let pattern_id = pattern_id
                    .as_str()
                    .ok_or_else(|| format!("{path}: target.pattern_id must be a string"))?;
                if !known_patterns.is_empty() && !known_patterns.contains(pattern_id) {
                    return Err(format!(
                        "{path}: pattern_id \"{pattern_id}\" is not defined in the pattern table"
                    ));
                }
            }
            if let Some(family) = family {
                check_family(family, &format!("{path}: target.family"))?;
            }
            if finite("new_mult").is_none() {
                return Err(format!("{path}: new_mult must be a finite number"));
            }
        }
        "base_payout_percentage" => {
            if !finite("flat").is_some_and(|f| f > 0.0) {
                return Err(format!("{path}: flat must be a positive number"));
            }
        }
        "heat_gain_scale" => {
            if !finite("scale").is_some_and(|s| s > 0.0) {
                return Err(format!("{path}: scale must be a positive number"));
            }
            if let Some(family) = modifier.get("family") {
                check_family(family, &format!("{path}: family"))?;
            }
        }
        other => return Err(format!("{path}: unsupported modifier type \"{other}\"")),
    }
    Ok(())
}

fn check_family(value: &Value, label: &str) -> Result<(), String> {
    let family = value
        .as_str()
        .ok_or_else(|| format!("{label} must be a string"))?;
    family
        .parse::<PatternKind>()
        .map(|_| ())
        .map_err(|e| format!("{label} {e}"))
}

fn positive_integer(m: &Obj, key: &str) -> Result<usize, String> {
    m.get(key)
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .ok_or_else(|| format!("{key} must be a positive integer"))
}

fn icon_number_map(value: &Value, label: &str, non_negative: bool) -> Result<(), String> {
    let map = value.as_object().ok_or_else(|| {
        format!("{label} must be an object whose keys are icon ids and values are numbers")
    })?;
    for (key, entry) in map {
        if !is_icon(key) {
            return Err(format!("{label} uses unknown icon id \"{key}\""));
        }
        let Some(n) = entry.as_f64().filter(|n| n.is_finite()) else {
            return Err(format!("{label} entry for \"{key}\" must be a finite number"));
        };
        if non_negative && n < 0.0 {
            return Err(format!("{label} entry for \"{key}\" must be non-negative"));
        }
    }
    Ok(())
}

fn is_icon(s: &str) -> bool {
    s.parse::<IconId>().is_ok()
}

fn is_hex_color(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#A1b2C3"));
        assert!(!is_hex_color("fff"));
        assert!(!is_hex_color("#ffff"));
        assert!(!is_hex_color("#ggg"));
    }
}
