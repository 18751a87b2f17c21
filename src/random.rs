//! Seeded splitmix64 generator
//!
//! Small enough to serialize with the game state, and plugs into `rand::Rng`
//! through `RngCore` so call sites can use `random_range` and friends.

use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Replacement seed for zero (splitmix never leaves zero on its own, but a
/// zero seed makes every level roll identical to the first)
const ZERO_SEED_FALLBACK: u64 = 0xDEAD_BEEF_CAFE_BABE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed != 0 { seed } else { ZERO_SEED_FALLBACK },
        }
    }

    /// Uniform value in [0, 1]
    pub fn next_uniform(&mut self) -> f64 {
        self.next_u64() as f64 / u64::MAX as f64
    }
}

impl RngCore for SeededRandom {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for SeededRandom {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
