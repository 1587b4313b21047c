//! Seeded random source shared by every stochastic choice in a pass.
//!
//! Weighted template picks, frontier selection and exit shuffles all draw
//! from one `LayoutRng`, so a seed fixes the whole draw sequence. The draw
//! counter lets callers check that replay never touches the generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic layout RNG
#[derive(Debug, Clone)]
pub struct LayoutRng {
    rng: ChaCha8Rng,
    seed: u64,
    draws: u64,
}

impl LayoutRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Restart the sequence from `seed` and reset the draw counter
    pub fn set_seed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn since the last reseed
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform integer in `[min, max_exclusive)`. An empty range returns
    /// `min` without drawing.
    pub fn uniform_int(&mut self, min: u32, max_exclusive: u32) -> u32 {
        if max_exclusive.saturating_sub(min) <= 1 {
            return min;
        }
        self.draws += 1;
        self.rng.gen_range(min..max_exclusive)
    }

    /// Wide variant of `uniform_int` for summed template weights
    pub fn uniform_u64(&mut self, min: u64, max_exclusive: u64) -> u64 {
        if max_exclusive.saturating_sub(min) <= 1 {
            return min;
        }
        self.draws += 1;
        self.rng.gen_range(min..max_exclusive)
    }

    /// Uniform index into a collection of `len` items
    pub fn index(&mut self, len: usize) -> usize {
        self.uniform_int(0, len as u32) as usize
    }

    /// Fisher-Yates shuffle driven by `uniform_int`
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.uniform_int(0, i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}
