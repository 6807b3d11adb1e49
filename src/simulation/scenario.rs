//! Build fully-initialized simulations from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a `Scenario`
//! containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - a stepper already in the `Ready` state, baseline energy seeded
//! - the branch edges when the branching layout was used, for line drawing

use crate::configuration::config::{BodyConfig, LayoutConfig, ScenarioConfig};
use crate::simulation::branching::BranchSpec;
use crate::simulation::engine::Engine;
use crate::simulation::error::{invalid, SimResult};
use crate::simulation::params::Parameters;
use crate::simulation::states::{EnsembleSpec, Particle, ParticleEnsemble};
use crate::simulation::stepper::SimulationStepper;

pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub stepper: SimulationStepper,
    pub edges: Vec<(usize, usize)>, // branching layout only
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> SimResult<Self> {
        // Parameters (runtime) from ParametersConfig
        let p_cfg = &cfg.parameters;
        let parameters = Parameters {
            G: p_cfg.G,
            dt: p_cfg.dt,
            decoherence_rate: p_cfg.decoherence_rate,
            fluctuation_scale: p_cfg.fluctuation_scale,
            feedback_rate: p_cfg.feedback_rate,
            eps_min: p_cfg.eps_min,
            correction_factor: p_cfg.correction_factor,
            measurement_gain: p_cfg.measurement_gain,
            seed: p_cfg.seed,
        };

        // Engine (runtime) from EngineConfig
        let engine = Engine::from(&cfg.engine);

        let mut stepper = SimulationStepper::new(engine.clone(), parameters.clone());
        let e_cfg = &cfg.ensemble;
        let mut edges = Vec::new();

        match e_cfg.layout {
            LayoutConfig::Uniform => {
                let spec = EnsembleSpec {
                    n: e_cfg.n,
                    bounds: e_cfg.bounds,
                    mass_scale: e_cfg.mass_scale,
                    velocity_range: e_cfg.velocity_range,
                    seed: parameters.seed,
                };
                stepper.initialize(&spec)?;
            }
            LayoutConfig::Branching => {
                let spec = BranchSpec {
                    depth: e_cfg.depth,
                    fan_out: e_cfg.fan_out,
                    mass_scale: e_cfg.mass_scale,
                    velocity_range: e_cfg.velocity_range,
                    seed: parameters.seed,
                };
                let (ensemble, layout) = ParticleEnsemble::initialize_branching(&spec)?;
                edges = layout.edges();
                stepper.initialize_with(ensemble)?;
            }
            LayoutConfig::Explicit => {
                if cfg.bodies.is_empty() {
                    return Err(invalid("layout `explicit` needs at least one entry under `bodies`"));
                }
                // Bodies: map `BodyConfig` -> runtime `Particle`
                let particles = cfg.bodies.iter().map(body_from_config).collect();
                stepper.initialize_with(ParticleEnsemble::from_particles(particles)?)?;
            }
        }

        Ok(Self {
            engine,
            parameters,
            stepper,
            edges,
        })
    }
}

fn body_from_config(bc: &BodyConfig) -> Particle {
    let p = if bc.quantum {
        Particle::quantum(bc.position(), bc.m)
    } else {
        Particle::classical(bc.position(), bc.m)
    };
    p.with_velocity(bc.velocity())
}
