//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness for one machine flows through its single SpinRng,
//! seeded from the RngSeed stored on the run record.
//!
//! Seeds arrive as numbers or strings (query parameters, saved runs).
//! Both are hashed through their text form, so `42` and `"42"` yield
//! the same stream. Any JSON number is accepted; integral floats print
//! without a fraction, so `42.0` seeds like `42`.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use std::fmt;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A seed as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RngSeed {
    Number(u64),
    /// Negative or fractional numbers.
    Numeric(serde_json::Number),
    Text(String),
}

impl RngSeed {
    /// FNV-1a over the seed's text form. Same text, same state.
    pub fn hash(&self) -> u64 {
        let text = self.to_string();
        text.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
        })
    }
}

impl fmt::Display for RngSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Numeric(n) => match n.as_f64() {
                Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e15 => {
                    write!(f, "{}", x as i64)
                }
                _ => write!(f, "{n}"),
            },
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RngSeed {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RngSeed {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RngSeed {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// The one deterministic RNG owned by a machine instance.
pub struct SpinRng {
    seed: RngSeed,
    inner: Pcg64Mcg,
}

impl SpinRng {
    pub fn new(seed: impl Into<RngSeed>) -> Self {
        let seed = seed.into();
        let inner = Pcg64Mcg::seed_from_u64(seed.hash());
        Self { seed, inner }
    }

    pub fn seed(&self) -> &RngSeed {
        &self.seed
    }

    /// Reset the stream as if freshly constructed from `seed`.
    pub fn set_seed(&mut self, seed: impl Into<RngSeed>) {
        *self = Self::new(seed);
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll an index in [0, n). Returns 0 for n == 0.
    pub fn next_index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_number_seeds_share_a_stream() {
        let mut a = SpinRng::new(42u64);
        let mut b = SpinRng::new("42");
        for _ in 0..16 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = SpinRng::new("unit");
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x), "out of range: {x}");
        }
    }

    #[test]
    fn set_seed_restarts_the_stream() {
        let mut rng = SpinRng::new("restart");
        let first: Vec<u64> = (0..4).map(|_| rng.next_f64().to_bits()).collect();
        rng.set_seed("restart");
        let again: Vec<u64> = (0..4).map(|_| rng.next_f64().to_bits()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn next_index_never_reaches_n() {
        let mut rng = SpinRng::new(7u64);
        for _ in 0..1_000 {
            assert!(rng.next_index(5) < 5);
        }
        assert_eq!(rng.next_index(0), 0);
    }
}
