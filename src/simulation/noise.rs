//! Per-particle random streams
//!
//! Every random draw inside a parallel pass comes from a generator keyed by
//! (seed, tick, particle index, stream). No generator is shared between
//! workers, so passes are race-free and a run is reproducible from its seed
//! regardless of how rayon splits the work.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::simulation::states::NVec3;

/// Which pass is drawing; keeps two passes in the same tick uncorrelated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Fluctuation = 1,
    StochasticKick = 2,
}

/// Mix the key into a single 64-bit seed
fn mix(seed: u64, tick: u64, index: usize, stream: Stream) -> u64 {
    seed.wrapping_mul(6364136223846793005)
        .wrapping_add(tick.wrapping_mul(1442695040888963407))
        .wrapping_add((index as u64).wrapping_mul(2862933555777941757))
        .wrapping_add((stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Generator for particle `index` at `tick`
pub fn particle_rng(seed: u64, tick: u64, index: usize, stream: Stream) -> StdRng {
    StdRng::seed_from_u64(mix(seed, tick, index, stream))
}

/// Offset with each component uniform in [-0.5, 0.5) * scale
pub fn centered_offset<R: Rng>(rng: &mut R, scale: f64) -> NVec3 {
    NVec3::new(
        (rng.gen::<f64>() - 0.5) * scale,
        (rng.gen::<f64>() - 0.5) * scale,
        (rng.gen::<f64>() - 0.5) * scale,
    )
}
