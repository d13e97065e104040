//! Catch probability policy
//!
//! A throw rolls `r` uniformly in `[0, range)` and succeeds when `r` is below
//! the species' capture rate, so the chance of a catch is
//! `min(1, capture_rate / range)`. The PokeAPI capture rate runs from 0 to 255,
//! which makes 256 the natural default range.

use rand::Rng;

/// Default roll range
pub const DEFAULT_CATCH_RANGE: u32 = 256;

/// Outcome of a single throw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchOutcome {
    Caught { roll: u32 },
    Escaped { roll: u32 },
}

impl CatchOutcome {
    pub fn is_caught(self) -> bool {
        matches!(self, CatchOutcome::Caught { .. })
    }
}

/// Named catch policy with a configurable roll range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchPolicy {
    range: u32,
}

impl Default for CatchPolicy {
    fn default() -> Self {
        Self {
            range: DEFAULT_CATCH_RANGE,
        }
    }
}

impl CatchPolicy {
    /// Policy rolling in `[0, range)`; a zero range is treated as 1
    pub fn new(range: u32) -> Self {
        Self {
            range: range.max(1),
        }
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    /// Probability that a throw at a species with `capture_rate` succeeds
    pub fn probability(&self, capture_rate: u32) -> f64 {
        (f64::from(capture_rate) / f64::from(self.range)).min(1.0)
    }

    /// Throws once using `rng`
    pub fn attempt<R: Rng + ?Sized>(&self, capture_rate: u32, rng: &mut R) -> CatchOutcome {
        let roll = rng.gen_range(0..self.range);
        if roll < capture_rate {
            CatchOutcome::Caught { roll }
        } else {
            CatchOutcome::Escaped { roll }
        }
    }
}
