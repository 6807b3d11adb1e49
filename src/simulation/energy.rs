//! Energy bookkeeping and the conservation correction pass
//!
//! Total energy = sum of kinetic terms `0.5 m |v|^2` plus the potential
//! `-G m_i m_j / d` of every unordered pair above the softening floor.
//! Per-particle terms are computed in parallel, collected in index order
//! and summed sequentially, so the total is identical across runs.

use rayon::prelude::*;

use crate::simulation::forces::separation;
use crate::simulation::states::ParticleEnsemble;

/// Kinetic + pairwise potential energy of the ensemble
#[allow(non_snake_case)]
pub fn total_energy(ens: &ParticleEnsemble, G: f64, eps_min: f64) -> f64 {
    let bodies = ens.particles();

    // Row i holds its kinetic term and the pairs (i, j > i)
    let rows: Vec<f64> = (0..bodies.len())
        .into_par_iter()
        .map(|i| {
            let bi = &bodies[i];
            let kinetic = 0.5 * bi.m * bi.v.norm_squared();

            let potential: f64 = bodies[i + 1..]
                .iter()
                .filter_map(|bj| separation(&bi.x, &bj.x, eps_min).map(|(_, d)| -G * bi.m * bj.m / d))
                .sum();

            kinetic + potential
        })
        .collect();

    rows.iter().sum()
}

/// Summary of one correction step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub measured: f64, // energy after integration, before the nudge
    pub per_particle: f64, // scalar added (divided by mass) to each velocity component
}

/// Pulls the ensemble toward the energy baseline carried between ticks
#[allow(non_snake_case)]
pub struct EnergyConservationCorrector {
    pub G: f64,
    pub eps_min: f64,
    pub correction_factor: f64,
}

impl EnergyConservationCorrector {
    pub fn measure(&self, ens: &ParticleEnsemble) -> f64 {
        total_energy(ens, self.G, self.eps_min)
    }

    /// Measure, nudge every velocity component by `correction / m`, then
    /// move the baseline to the measured value
    ///
    /// The nudge is one scalar applied identically on all three axes; it is
    /// not directional and does not conserve momentum.
    pub fn correct(&self, ens: &mut ParticleEnsemble, baseline: &mut f64) -> Correction {
        let measured = self.measure(ens);
        let n = ens.len() as f64;
        let per_particle = (*baseline - measured) / n * self.correction_factor;

        ens.particles_mut().par_iter_mut().for_each(|p| {
            let dv = per_particle / p.m;
            p.v.add_scalar_mut(dv);
        });

        *baseline = measured;
        Correction { measured, per_particle }
    }
}
