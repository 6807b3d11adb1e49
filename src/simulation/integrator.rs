//! Position integration
//!
//! Explicit Euler drift `x += v * dt`, independent per particle.
//! Velocities are only changed by the earlier passes of the tick.

use rayon::prelude::*;

use super::states::ParticleEnsemble;

/// Advance every position by one step using the current velocities
pub fn integrate_positions(ens: &mut ParticleEnsemble, dt: f64) {
    ens.particles_mut().par_iter_mut().for_each(|p| {
        p.x += dt * p.v;
    });
}
