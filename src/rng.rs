//! Seeded random source.
//!
//! Every draw in the simulation goes through a [`RandomSource`]. Sources are
//! never long-lived: each tick (and each player action) builds a fresh one
//! from the run's base seed and the current tick, so any tick can be replayed
//! from a recorded `(seed, tick)` pair without re-running the ticks before it.

use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, Open01, StandardUniform};
use std::f64::consts::TAU;

/// ChaCha stream used by ticks.
const TICK_STREAM: u64 = 0;
/// ChaCha stream used by player actions.
const ACTION_STREAM: u64 = 1;

/// Deterministic pseudo-random generator.
///
/// Same seed and same call sequence produce bit-identical outputs.
pub struct RandomSource {
    seed: u64,
    rng: ChaCha12Rng,
}

impl RandomSource {
    /// Create a source from a raw seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    /// Source for the tick that starts at `tick`.
    pub fn for_tick(base_seed: u64, tick: u64) -> Self {
        Self::on_stream(base_seed.wrapping_add(tick), TICK_STREAM)
    }

    /// Source for a player action applied at `tick`.
    ///
    /// Shares the `(seed, tick)` key with [`RandomSource::for_tick`] but draws
    /// from a separate stream, so an action never consumes the next tick's draws.
    pub fn for_action(base_seed: u64, tick: u64) -> Self {
        Self::on_stream(base_seed.wrapping_add(tick), ACTION_STREAM)
    }

    fn on_stream(seed: u64, stream: u64) -> Self {
        let mut source = Self::new(seed);
        source.rng.set_stream(stream);
        source
    }

    /// Seed this source was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        StandardUniform.sample(&mut self.rng)
    }

    /// Uniform value in `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Normally distributed value (Box-Muller transform of two uniform draws).
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // Open interval keeps the logarithm finite.
        let u_1: f64 = Open01.sample(&mut self.rng);
        let u_2 = self.next();
        let z = (-2.0 * u_1.ln()).sqrt() * (TAU * u_2).cos();
        mean + z * std_dev
    }

    /// Bernoulli trial that succeeds with probability `prob`.
    pub fn chance(&mut self, prob: f64) -> bool {
        self.next() < prob
    }

    /// Shuffled copy of `items` (Fisher-Yates); the input is left untouched.
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut shuffled = items.to_vec();
        shuffled.shuffle(&mut self.rng);
        shuffled
    }
}
