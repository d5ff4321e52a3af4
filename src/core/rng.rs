//! Deterministic random source for battle runs
//!
//! A battle run owns exactly one `BattleRng`. Nothing in the engine consults
//! ambient entropy, so a (configuration, seed) pair always maps to the same
//! battle result.
//!
//! The generator is a 32-bit xorshift seeded from an FNV-1a hash of the seed's
//! textual content. Numeric seeds hash their decimal form, so `42` and `"42"`
//! seed identical streams.

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// xorshift32 has an all-zero fixed point; a zero hash is replaced by this
const ZERO_STATE_REPLACEMENT: u32 = 0x9e37_79b9;

/// Largest value `next()` may return in pinned mode (keeps the [0,1) contract)
const UNIT_UPPER: f64 = 1.0 - f64::EPSILON;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Seed accepted by the engine: either a number or an arbitrary string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BattleSeed {
    Number(u64),
    Text(String),
}

impl Default for BattleSeed {
    fn default() -> Self {
        BattleSeed::Number(0)
    }
}

impl From<u64> for BattleSeed {
    fn from(value: u64) -> Self {
        BattleSeed::Number(value)
    }
}

impl From<&str> for BattleSeed {
    fn from(value: &str) -> Self {
        BattleSeed::Text(value.to_string())
    }
}

impl From<String> for BattleSeed {
    fn from(value: String) -> Self {
        BattleSeed::Text(value)
    }
}

impl BattleSeed {
    /// 32-bit FNV-1a hash of the seed's content
    pub fn content_hash(&self) -> u32 {
        match self {
            BattleSeed::Number(n) => fnv1a(n.to_string().as_bytes()),
            BattleSeed::Text(s) => fnv1a(s.as_bytes()),
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Seeded xorshift32 random source
#[derive(Debug, Clone)]
pub struct BattleRng {
    state: u32,
    /// When set, every draw returns this value clamped into the requested interval
    pinned: Option<f64>,
    draws: u64,
}

impl BattleRng {
    pub fn new(seed: &BattleSeed) -> Self {
        let hash = seed.content_hash();
        Self {
            state: if hash == 0 { ZERO_STATE_REPLACEMENT } else { hash },
            pinned: None,
            draws: 0,
        }
    }

    pub fn from_u64(seed: u64) -> Self {
        Self::new(&BattleSeed::Number(seed))
    }

    /// A source whose every draw is pinned to `value`.
    ///
    /// `range(min, max)` returns `value` clamped into `[min, max]`, `next()`
    /// returns it clamped into `[0, 1)`. Pinned at 1.0 this means: random
    /// factors sit at exactly 1.0, integer ranges yield their maximum and
    /// `next_bool(p)` is false for every `p < 1`.
    pub fn pinned(value: f64) -> Self {
        Self {
            state: ZERO_STATE_REPLACEMENT,
            pinned: Some(value),
            draws: 0,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Number of draws consumed so far
    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn step(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform float in [0, 1)
    pub fn next(&mut self) -> f64 {
        self.draws += 1;
        match self.pinned {
            Some(value) => value.clamp(0.0, UNIT_UPPER),
            None => f64::from(self.step()) / TWO_POW_32,
        }
    }

    /// Uniform float in [min, max)
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        if let Some(value) = self.pinned {
            self.draws += 1;
            return value.clamp(lo, hi);
        }
        lo + self.next() * (hi - lo)
    }

    /// Uniform integer in [min, max], both ends inclusive
    pub fn next_range_int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.next() * span).floor() as i64;
        (min + offset).min(max)
    }

    /// True with probability `p`
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next() < p
    }

    /// Uniformly chosen element, `None` for an empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.next_range_int(0, items.len() as i64 - 1) as usize;
        items.get(idx)
    }

    /// Shuffle in place.
    ///
    /// Pinned draws do not form a uniform bit stream (rand's rejection
    /// sampler would never accept them), so a pinned source leaves the
    /// order untouched.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        if self.pinned.is_some() {
            return;
        }
        items.shuffle(self);
    }
}

impl RngCore for BattleRng {
    fn next_u32(&mut self) -> u32 {
        match self.pinned {
            Some(_) => (self.next() * TWO_POW_32) as u32,
            None => {
                self.draws += 1;
                self.step()
            }
        }
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
