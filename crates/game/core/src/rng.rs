//! Deterministic random number generation.
//!
//! Dragon movement, treasure image variants and dungeon generation all
//! draw from a seeded generator: given the same session seed the whole
//! game replays identically, which keeps scenario tests exact.

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be pure functions of the seed: the same seed
/// always produces the same value.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Generate a random value in range `[min, max]` inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }

    /// Pick an index into a collection of `len` elements.
    ///
    /// Returns 0 for an empty collection; callers check emptiness first.
    fn pick_index(&self, seed: u64, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u32(seed) as usize) % len
    }
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// PCG-XSH-RR: a single multiply plus xorshift and rotate, producing
/// 32-bit output from 64-bit state. Small, fast and statistically solid;
/// being stateless per call, it is trivially deterministic.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    /// Advance the PCG state by one LCG step.
    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// XSH-RR output permutation: xorshift high bits, then rotate by the
    /// topmost bits.
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        let state = Self::pcg_step(seed);
        Self::pcg_output(state)
    }
}

/// Compute a per-event seed from session state components.
///
/// Combines the session seed with a draw counter plus caller context so
/// that every random event in a session gets an independent value while
/// remaining replayable.
///
/// Use different `context` values when one event needs several
/// independent rolls (e.g. one per dragon in a movement batch).
pub fn compute_seed(game_seed: u64, nonce: u64, actor_id: u32, context: u32) -> u64 {
    // Mix all inputs using simple hash combiners; the constants come
    // from SplitMix64 and FxHash.
    let mut hash = game_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor_id as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Final avalanche step.
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_value() {
        let rng = PcgRng;
        assert_eq!(rng.next_u32(42), rng.next_u32(42));
        assert_ne!(rng.next_u32(42), rng.next_u32(43));
    }

    #[test]
    fn range_is_inclusive_and_clamped() {
        let rng = PcgRng;
        for seed in 0..200 {
            let value = rng.range(seed, 3, 7);
            assert!((3..=7).contains(&value));
        }
        assert_eq!(rng.range(5, 9, 9), 9);
        assert_eq!(rng.range(5, 9, 2), 9);
    }

    #[test]
    fn compute_seed_separates_contexts() {
        let a = compute_seed(1, 2, 3, 0);
        let b = compute_seed(1, 2, 3, 1);
        assert_ne!(a, b);
    }
}
