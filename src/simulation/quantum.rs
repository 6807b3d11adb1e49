//! Quantum state model
//!
//! Sub-passes run in this order each tick:
//! 1. fluctuation    random positional jitter on quantum particles
//! 2. decoherence    coherence drains with local curvature, flips to classical at 0
//! 3. feedback       surviving quantum particles accumulate curvature influence
//!
//! and, when enabled,
//! 4. stochastic kicks      Wiener increments on every velocity
//! 5. measurement feedback  velocity pulled along position, weighted by coherence
//!
//! Each sub-pass reads other particles only through a snapshot taken before
//! it starts, and writes only to the particle it is processing.

use rayon::prelude::*;

use crate::simulation::forces::separation;
use crate::simulation::noise::{centered_offset, particle_rng, Stream};
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec3, ParticleEnsemble};

/// Sum of `m_j / d^2` over every other particle above the softening floor
pub fn local_curvature(i: usize, positions: &[NVec3], masses: &[f64], eps_min: f64) -> f64 {
    let xi = &positions[i];
    positions
        .iter()
        .zip(masses)
        .enumerate()
        .filter(|(j, _)| *j != i)
        .filter_map(|(_, (xj, mj))| separation(xi, xj, eps_min).map(|(_, d)| mj / (d * d)))
        .sum()
}

pub struct QuantumStateModel<'a> {
    params: &'a Parameters,
    tick: u64, // keys the per-particle noise streams
}

impl<'a> QuantumStateModel<'a> {
    pub fn new(params: &'a Parameters, tick: u64) -> Self {
        Self { params, tick }
    }

    /// Jitter each quantum particle by `fluctuation_scale * mass`
    ///
    /// Only the particle's own mass and position are touched, so there is
    /// nothing to snapshot.
    pub fn apply_fluctuation(&self, ens: &mut ParticleEnsemble) {
        let (seed, tick, scale) = (self.params.seed, self.tick, self.params.fluctuation_scale);

        ens.particles_mut()
            .par_iter_mut()
            .enumerate()
            .filter(|(_, p)| p.is_quantum)
            .for_each(|(i, p)| {
                let mut rng = particle_rng(seed, tick, i, Stream::Fluctuation);
                p.x += centered_offset(&mut rng, scale * p.m);
            });
    }

    /// Drain coherence by `rate * dt * local_curvature`; returns how many
    /// particles became classical in this pass
    pub fn apply_decoherence(&self, ens: &mut ParticleEnsemble) -> usize {
        let positions = ens.positions();
        let masses = ens.masses();
        let drain = self.params.decoherence_rate * self.params.dt;
        let eps_min = self.params.eps_min;

        ens.particles_mut()
            .par_iter_mut()
            .enumerate()
            .filter(|(_, p)| p.is_quantum)
            .map(|(i, p)| {
                p.coherence -= drain * local_curvature(i, &positions, &masses, eps_min);
                if p.coherence <= 0.0 {
                    p.coherence = 0.0;
                    p.is_quantum = false;
                    1
                } else {
                    0
                }
            })
            .sum::<usize>()
    }

    /// `curvature_influence += coherence * feedback_rate`, clamped to [-1, 1]
    pub fn apply_curvature_feedback(&self, ens: &mut ParticleEnsemble) {
        let rate = self.params.feedback_rate;

        ens.particles_mut()
            .par_iter_mut()
            .filter(|p| p.is_quantum)
            .for_each(|p| {
                p.curvature_influence = (p.curvature_influence + p.coherence * rate).clamp(-1.0, 1.0);
            });
    }

    /// `v += dW`, each component uniform in [-0.5, 0.5) * sqrt(dt)
    pub fn apply_stochastic_kicks(&self, ens: &mut ParticleEnsemble) {
        let (seed, tick) = (self.params.seed, self.tick);
        let sqrt_dt = self.params.dt.sqrt();

        ens.particles_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, p)| {
                let mut rng = particle_rng(seed, tick, i, Stream::StochasticKick);
                p.v += centered_offset(&mut rng, sqrt_dt);
            });
    }

    /// `v += coherence * gain * x`
    pub fn apply_measurement_feedback(&self, ens: &mut ParticleEnsemble) {
        let gain = self.params.measurement_gain;

        ens.particles_mut().par_iter_mut().for_each(|p| {
            let feedback = p.coherence * gain;
            p.v += feedback * p.x;
        });
    }
}
