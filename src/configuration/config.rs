//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – which passes run each tick and the diagnostic cadence
//! - [`ParametersConfig`] – physical constants and numerical settings
//! - [`EnsembleConfig`]   – how the initial particles are laid out
//! - [`BodyConfig`]       – explicit particles, used with `layout: explicit`
//! - [`ScenarioConfig`]   – top-level wrapper
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   passes:
//!     fluctuation: true
//!     decoherence: true
//!     feedback: true
//!     energy_correction: true
//!     stochastic_kicks: false
//!     measurement_feedback: false
//!   diagnostic_every: 100   # log total energy every 100 ticks
//!
//! parameters:
//!   G: 0.001                # gravitational constant
//!   dt: 0.01                # time step
//!   decoherence_rate: 0.01
//!   fluctuation_scale: 1.0e-5
//!   feedback_rate: 0.01
//!   eps_min: 0.01           # softening floor
//!   correction_factor: 1.0
//!   measurement_gain: 0.1
//!   seed: 42
//!
//! ensemble:
//!   layout: uniform         # uniform | branching | explicit
//!   n: 1000
//!   bounds: 10.0
//!   mass_scale: 1.0
//!   velocity_range: 0.05
//! ```
//!
//! Every field has a default, so a scenario only lists what it changes.

use serde::Deserialize;

use crate::simulation::states::NVec3;

/// Enabled-pass flags as written in YAML
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PassConfig {
    pub fluctuation: bool,
    pub decoherence: bool,
    pub feedback: bool,
    pub energy_correction: bool,
    pub stochastic_kicks: bool,
    pub measurement_feedback: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            fluctuation: true,
            decoherence: true,
            feedback: true,
            energy_correction: true,
            stochastic_kicks: false,
            measurement_feedback: false,
        }
    }
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub passes: PassConfig, // which passes run each tick
    pub diagnostic_every: Option<u64>, // emit total energy every k ticks
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            passes: PassConfig::default(),
            diagnostic_every: Some(100),
        }
    }
}

/// Physical constants and numerical settings
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub G: f64,                 // gravitational constant
    pub dt: f64,                // time step
    pub decoherence_rate: f64,  // coherence drained per unit curvature per unit time
    pub fluctuation_scale: f64, // positional noise per unit mass
    pub feedback_rate: f64,     // curvature influence per unit coherence
    pub eps_min: f64,           // softening floor
    pub correction_factor: f64, // energy correction gain
    pub measurement_gain: f64,  // measurement feedback gain
    pub seed: u64,              // deterministic seed
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            G: 0.001,
            dt: 0.01,
            decoherence_rate: 0.01,
            fluctuation_scale: 1.0e-5,
            feedback_rate: 0.01,
            eps_min: 0.01,
            correction_factor: 1.0,
            measurement_gain: 0.1,
            seed: 42,
        }
    }
}

/// How the initial ensemble is produced
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutConfig {
    #[serde(rename = "uniform")] // random particles inside a cube
    #[default]
    Uniform,

    #[serde(rename = "branching")] // breadth-first tree of unit-length branches
    Branching,

    #[serde(rename = "explicit")] // particles listed under `bodies`
    Explicit,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EnsembleConfig {
    pub layout: LayoutConfig,
    pub n: usize,            // uniform: particle count
    pub bounds: f64,         // uniform: half-width of the sampling cube
    pub mass_scale: f64,     // masses drawn from (0, mass_scale]
    pub velocity_range: f64, // velocities drawn from [-range, range]
    pub depth: usize,        // branching: levels below the root
    pub fan_out: usize,      // branching: children per node
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::Uniform,
            n: 1000,
            bounds: 10.0,
            mass_scale: 1.0,
            velocity_range: 0.05,
            depth: 3,
            fan_out: 5,
        }
    }
}

/// Configuration for a single particle's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: [f64; 3],       // initial position
    #[serde(default)]
    pub v: [f64; 3],       // initial velocity
    pub m: f64,            // mass, must be > 0
    #[serde(default = "default_quantum")]
    pub quantum: bool,     // starts quantum with full coherence
}

fn default_quantum() -> bool {
    true
}

impl BodyConfig {
    pub fn position(&self) -> NVec3 {
        NVec3::from(self.x)
    }

    pub fn velocity(&self) -> NVec3 {
        NVec3::from(self.v)
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,         // pass selection and diagnostics
    pub parameters: ParametersConfig, // physical and numerical parameters
    pub ensemble: EnsembleConfig,     // initial layout
    pub bodies: Vec<BodyConfig>,      // explicit particles
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}
