//! Injectable randomness.
//!
//! Every probabilistic branch in the glitch layer draws from a
//! [`RandomSource`], so tests can drive the controller with a seeded generator
//! or a scripted sequence.

use rand::{Rng, RngCore};
use rand_xoshiro::{rand_core::SeedableRng, Xoshiro256StarStar};

pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform sample in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Uniform index in `0..len`. `len` must be positive.
    fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

impl<R: RngCore> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Generator used by the browser build and by seeded tests.
pub type GlitchRng = Xoshiro256StarStar;

pub fn seeded(seed: u64) -> GlitchRng {
    Xoshiro256StarStar::seed_from_u64(seed)
}

/// Replays a fixed list of samples, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct Scripted {
    samples: Vec<f64>,
    pos: usize,
}

impl Scripted {
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        let samples = samples.into();
        assert!(!samples.is_empty(), "scripted source needs at least one sample");
        Self { samples, pos: 0 }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for Scripted {
    fn next_f64(&mut self) -> f64 {
        let v = self.samples[self.pos % self.samples.len()];
        self.pos += 1;
        v
    }
}
