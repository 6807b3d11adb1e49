//! Core state types for the particle ensemble
//!
//! Defines:
//! - `Particle`          one point mass with its quantum bookkeeping
//! - `ParticleEnsemble`  fixed-length particle storage, index = identity
//! - `SimulationState`   everything one running simulation owns
//! - `Snapshot`          read-only view handed to renderers after a tick

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::simulation::error::{invalid, SimResult};
use crate::simulation::params::Parameters;

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64, // mass, > 0 for the particle's whole life
    pub is_quantum: bool, // once false, stays false
    pub coherence: f64, // [0, 1]
    pub curvature_influence: f64, // [-1, 1]
}

impl Particle {
    /// Quantum particle at rest with full coherence
    pub fn quantum(x: NVec3, m: f64) -> Self {
        Self {
            x,
            v: NVec3::zeros(),
            m,
            is_quantum: true,
            coherence: 1.0,
            curvature_influence: 0.0,
        }
    }

    /// Classical particle at rest
    pub fn classical(x: NVec3, m: f64) -> Self {
        Self {
            x,
            v: NVec3::zeros(),
            m,
            is_quantum: false,
            coherence: 0.0,
            curvature_influence: 0.0,
        }
    }

    /// Builder-style velocity override
    pub fn with_velocity(mut self, v: NVec3) -> Self {
        self.v = v;
        self
    }
}

/// How `ParticleEnsemble::initialize` samples the initial state
#[derive(Debug, Clone)]
pub struct EnsembleSpec {
    pub n: usize, // particle count
    pub bounds: f64, // half-width of the sampling cube
    pub mass_scale: f64, // masses drawn from (0, mass_scale]
    pub velocity_range: f64, // velocities drawn from [-range, range]
    pub seed: u64, // deterministic seed
}

impl EnsembleSpec {
    pub fn new(n: usize, bounds: f64, mass_scale: f64, seed: u64) -> Self {
        Self {
            n,
            bounds,
            mass_scale,
            velocity_range: 0.05,
            seed,
        }
    }
}

/// Fixed-size, ordered particle storage
///
/// The length is decided at construction and never changes; a particle's
/// index is its identity for the ensemble's lifetime. All evolution happens
/// through the passes acting on `particles_mut()` by index.
#[derive(Debug, Clone)]
pub struct ParticleEnsemble {
    particles: Box<[Particle]>,
}

impl ParticleEnsemble {
    /// Populate `spec.n` particles uniformly inside the cube `[-bounds, bounds]^3`
    pub fn initialize(spec: &EnsembleSpec) -> SimResult<Self> {
        if spec.n == 0 {
            return Err(invalid("particle count must be positive"));
        }
        if !(spec.mass_scale > 0.0) || !spec.mass_scale.is_finite() {
            return Err(invalid(format!("mass scale must be positive, got {}", spec.mass_scale)));
        }
        if !(spec.bounds >= 0.0) || !spec.bounds.is_finite() {
            return Err(invalid(format!("bounds must be a finite half-width, got {}", spec.bounds)));
        }
        if !(spec.velocity_range >= 0.0) || !spec.velocity_range.is_finite() {
            return Err(invalid(format!("velocity range must be >= 0, got {}", spec.velocity_range)));
        }

        let mut rng = StdRng::seed_from_u64(spec.seed);
        let particles: Vec<Particle> = (0..spec.n)
            .map(|_| {
                let x = sample_cube(&mut rng, spec.bounds);
                let v = sample_cube(&mut rng, spec.velocity_range);
                // gen::<f64>() is in [0, 1), so 1 - u is in (0, 1]
                let m = spec.mass_scale * (1.0 - rng.gen::<f64>());
                let is_quantum = rng.gen_bool(0.5);

                Particle {
                    x,
                    v,
                    m,
                    is_quantum,
                    coherence: if is_quantum { 1.0 } else { 0.0 },
                    curvature_influence: 0.0,
                }
            })
            .collect();

        Ok(Self { particles: particles.into_boxed_slice() })
    }

    /// Wrap an explicit particle list (scenario `bodies:` or hand-built tests)
    pub fn from_particles(particles: Vec<Particle>) -> SimResult<Self> {
        if particles.is_empty() {
            return Err(invalid("particle count must be positive"));
        }
        for (i, p) in particles.iter().enumerate() {
            if !(p.m > 0.0) || !p.m.is_finite() {
                return Err(invalid(format!("particle {i} has non-positive mass {}", p.m)));
            }
            if !p.x.iter().chain(p.v.iter()).all(|c| c.is_finite()) {
                return Err(invalid(format!("particle {i} has non-finite position or velocity")));
            }
            if !(0.0..=1.0).contains(&p.coherence) {
                return Err(invalid(format!("particle {i} coherence {} outside [0, 1]", p.coherence)));
            }
            if !(-1.0..=1.0).contains(&p.curvature_influence) {
                return Err(invalid(format!(
                    "particle {i} curvature influence {} outside [-1, 1]",
                    p.curvature_influence
                )));
            }
        }
        Ok(Self { particles: particles.into_boxed_slice() })
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the stored particles; a slice cannot be resized
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// Copy of every position, used as the read-only side of a pass
    pub fn positions(&self) -> Vec<NVec3> {
        self.particles.iter().map(|p| p.x).collect()
    }

    /// Copy of every mass
    pub fn masses(&self) -> Vec<f64> {
        self.particles.iter().map(|p| p.m).collect()
    }

    pub fn quantum_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_quantum).count()
    }
}

impl std::ops::Index<usize> for ParticleEnsemble {
    type Output = Particle;

    fn index(&self, i: usize) -> &Particle {
        &self.particles[i]
    }
}

/// Uniform sample inside `[-half, half]^3`
pub(crate) fn sample_cube<R: Rng>(rng: &mut R, half: f64) -> NVec3 {
    NVec3::new(
        (rng.gen::<f64>() - 0.5) * 2.0 * half,
        (rng.gen::<f64>() - 0.5) * 2.0 * half,
        (rng.gen::<f64>() - 0.5) * 2.0 * half,
    )
}

/// Everything one running simulation owns
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub ensemble: ParticleEnsemble,
    pub tick: u64, // completed ticks
    pub total_energy: f64, // energy baseline carried between ticks
    pub params: Parameters,
}

/// What a renderer needs for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub x: NVec3,
    pub is_quantum: bool,
}

/// Read-only state after a tick
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub particles: Vec<ParticleView>,
}

impl Snapshot {
    pub fn of(state: &SimulationState) -> Self {
        Self {
            tick: state.tick,
            particles: state
                .ensemble
                .iter()
                .map(|p| ParticleView { x: p.x, is_quantum: p.is_quantum })
                .collect(),
        }
    }
}
