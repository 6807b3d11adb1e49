//! Force / acceleration contributors for the ensemble
//!
//! Defines the acceleration trait, direct Newtonian gravity with a hard
//! softening floor, and the `ForceField` pass that turns accumulated
//! accelerations into velocity kicks

use rayon::prelude::*;

use crate::simulation::states::{NVec3, ParticleEnsemble};

/// Displacement and distance from `xi` to `xj`, or `None` when the pair is
/// closer than the softening floor and must be skipped
///
/// Every pairwise site (gravity, curvature, potential energy) goes through
/// here so a coincident pair can never reach a division.
#[inline]
pub fn separation(xi: &NVec3, xj: &NVec3, eps_min: f64) -> Option<(NVec3, f64)> {
    let r = xj - xi;
    let d = r.norm();
    if d > eps_min {
        Some((r, d))
    } else {
        None
    }
}

/// Trait for 3D acceleration sources operating on a [`ParticleEnsemble`]
/// Implementations add their contribution into `out[i]` for each particle
pub trait Acceleration3 {
    fn acceleration(&self, ens: &ParticleEnsemble, out: &mut [NVec3]);
}

/// Collection of acceleration terms
/// Each term implements [`Acceleration3`] and their contributions are summed
/// into a single acceleration vector per particle
pub struct AccelSet3 {
    terms: Vec<Box<dyn Acceleration3 + Send + Sync>>,
}

impl Default for AccelSet3 {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelSet3 {
    /// Constructor
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration3 + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations for all particles in `ens`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, ens: &ParticleEnsemble, out: &mut [NVec3]) {
        // Zero buffer
        out.par_iter_mut().for_each(|a| *a = NVec3::zeros());
        // Iterate over all acceleration contributors
        for term in &self.terms {
            term.acceleration(ens, out);
        }
    }
}

/// Direct n^2 Newtonian gravity with a hard softening floor
///
/// Pairs closer than `eps_min` contribute nothing. Each row `i` is summed
/// over `j` in index order, so the result does not depend on scheduling.
/// Any pair above the floor gives equal and opposite forces; skipping pairs
/// at the floor can break exact symmetry for particles hovering around it,
/// which is an accepted approximation.
#[allow(non_snake_case)]
pub struct NewtonianGravity3 {
    pub G: f64,
    pub eps_min: f64,
}

impl Acceleration3 for NewtonianGravity3 {
    fn acceleration(&self, ens: &ParticleEnsemble, out: &mut [NVec3]) {
        let bodies = ens.particles();

        out.par_iter_mut().enumerate().for_each(|(i, acc)| {
            let bi = &bodies[i];
            let mut f = NVec3::zeros();

            for (j, bj) in bodies.iter().enumerate() {
                if i == j {
                    continue;
                }
                let Some((r, d)) = separation(&bi.x, &bj.x, self.eps_min) else {
                    continue;
                };

                // |F| = G m_i m_j / d^2 along the unit vector i -> j
                let force = self.G * bi.m * bj.m / (d * d);
                f += (force / d) * r;
            }

            *acc += f / bi.m;
        });
    }
}

/// The gravity pass: accelerations from a consistent snapshot, then
/// `v += a * dt` for every particle
pub struct ForceField {
    forces: AccelSet3,
}

impl ForceField {
    #[allow(non_snake_case)]
    pub fn newtonian(G: f64, eps_min: f64) -> Self {
        Self {
            forces: AccelSet3::new().with(NewtonianGravity3 { G, eps_min }),
        }
    }

    /// Read every position first, then kick every velocity
    pub fn apply_gravity(&self, ens: &mut ParticleEnsemble, dt: f64) {
        let mut acc = vec![NVec3::zeros(); ens.len()];
        self.forces.accumulate_accels(ens, &mut acc);

        ens.particles_mut()
            .par_iter_mut()
            .zip(acc.par_iter())
            .for_each(|(p, a)| p.v += dt * *a);
    }
}
