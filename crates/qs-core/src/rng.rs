//! Random-variate sources.
//!
//! Models never draw from an RNG directly: they ask an injected
//! [`VariateSource`] for exponential and uniform variates.  Production runs
//! use [`SimRng`] (seeded `SmallRng`); tests use [`FixedVariates`] or
//! [`ScriptedVariates`] so that every arrival and service time is known in
//! advance.
//!
//! # Determinism strategy
//!
//! A run is reproducible for a fixed seed and a fixed program structure: the
//! kernel executes same-time entries in insertion order, so the sequence of
//! variate requests is itself deterministic.  Replications pass each run
//! its own seed; nothing is shared between runs.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp1;

// ── VariateSource ─────────────────────────────────────────────────────────────

/// The variate shapes the models need.
pub trait VariateSource {
    /// Exponentially distributed value with the given mean.
    ///
    /// An infinite mean yields `f64::INFINITY`; a non-positive mean yields 0.
    fn exponential(&mut self, mean: f64) -> f64;

    /// Uniformly distributed value in `[low, high)`.  Returns `low` when the
    /// range is empty.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

impl<V: VariateSource + ?Sized> VariateSource for Box<V> {
    fn exponential(&mut self, mean: f64) -> f64 {
        (**self).exponential(mean)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Seeded simulation RNG.
///
/// Used only in single-threaded contexts; parallel replications give each
/// run its own `SimRng`.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }
}

impl VariateSource for SimRng {
    fn exponential(&mut self, mean: f64) -> f64 {
        if mean.is_infinite() {
            return f64::INFINITY;
        }
        if !(mean > 0.0) {
            return 0.0;
        }
        let unit: f64 = self.0.sample(Exp1);
        unit * mean
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if !(low < high) {
            return low;
        }
        self.0.gen_range(low..high)
    }
}

// ── FixedVariates ─────────────────────────────────────────────────────────────

/// Degenerate source: every exponential is its mean, every uniform is the
/// midpoint of its range.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedVariates;

impl VariateSource for FixedVariates {
    fn exponential(&mut self, mean: f64) -> f64 {
        mean.max(0.0)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low < high { low + (high - low) / 2.0 } else { low }
    }
}

// ── ScriptedVariates ──────────────────────────────────────────────────────────

/// Replays pre-recorded values in order; falls back to [`FixedVariates`]
/// once a script runs dry.
#[derive(Clone, Debug, Default)]
pub struct ScriptedVariates {
    exponentials: VecDeque<f64>,
    uniforms:     VecDeque<f64>,
}

impl ScriptedVariates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values returned by successive `exponential` calls (means ignored).
    pub fn with_exponentials(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.exponentials.extend(values);
        self
    }

    /// Values returned by successive `uniform` calls (ranges ignored).
    pub fn with_uniforms(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.uniforms.extend(values);
        self
    }

    /// Scripted values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.exponentials.len() + self.uniforms.len()
    }
}

impl VariateSource for ScriptedVariates {
    fn exponential(&mut self, mean: f64) -> f64 {
        self.exponentials
            .pop_front()
            .unwrap_or_else(|| FixedVariates.exponential(mean))
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.uniforms
            .pop_front()
            .unwrap_or_else(|| FixedVariates.uniform(low, high))
    }
}
