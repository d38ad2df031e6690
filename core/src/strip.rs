//! Weighted reel strip generation.

use crate::rng::SpinRng;
use crate::types::IconId;
use std::collections::BTreeMap;

/// Build one strip by sampling the cumulative weight table `reel_length`
/// times. Icons with weight 0 never appear. An empty pool (or a zero
/// length) yields the fallback strip: `IconId::FALLBACK` repeated
/// `max(1, reel_length)` times.
pub fn generate_strip(
    weights: &BTreeMap<IconId, f64>,
    reel_length: usize,
    rng: &mut SpinRng,
) -> Vec<IconId> {
    let mut cumulative: Vec<(IconId, f64)> = Vec::new();
    let mut total = 0.0;
    for (id, weight) in weights {
        if *weight > 0.0 {
            total += weight;
            cumulative.push((*id, total));
        }
    }

    if cumulative.is_empty() || reel_length == 0 {
        log::warn!(
            "Degenerate icon pool (total weight {total}, reel length {reel_length}); \
             using fallback strip"
        );
        return fallback_strip(reel_length);
    }

    (0..reel_length)
        .map(|_| {
            let u = rng.next_f64() * total;
            cumulative
                .iter()
                .find(|(_, max)| *max >= u)
                .or(cumulative.last())
                .map(|(id, _)| *id)
                .unwrap_or(IconId::FALLBACK)
        })
        .collect()
}

/// One strip per column, generated left to right from the same RNG.
pub fn generate_strips(
    weights: &BTreeMap<IconId, f64>,
    columns: usize,
    reel_length: usize,
    rng: &mut SpinRng,
) -> Vec<Vec<IconId>> {
    (0..columns)
        .map(|_| generate_strip(weights, reel_length, rng))
        .collect()
}

pub fn fallback_strip(reel_length: usize) -> Vec<IconId> {
    vec![IconId::FALLBACK; reel_length.max(1)]
}

/// True when every slot holds the fallback icon.
pub fn is_degenerate(strip: &[IconId]) -> bool {
    strip.iter().all(|id| *id == IconId::FALLBACK)
}
