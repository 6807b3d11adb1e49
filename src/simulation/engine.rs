//! High-level runtime engine settings
//!
//! Selects which optional passes run each tick and how often the
//! energy diagnostic is emitted. Chosen once when the stepper is built

use crate::configuration::config::{EngineConfig, PassConfig};

/// Enabled-pass flags. Gravity and integration always run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSet {
    pub fluctuation: bool,
    pub decoherence: bool,
    pub feedback: bool,
    pub energy_correction: bool,
    pub stochastic_kicks: bool, // Wiener velocity noise, off by default
    pub measurement_feedback: bool, // velocity pulled along position by coherence, off by default
}

impl Default for PassSet {
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

impl PassSet {
    /// Gravity + integration only
    pub fn classical() -> Self {
        Self {
            fluctuation: false,
            decoherence: false,
            feedback: false,
            energy_correction: false,
            stochastic_kicks: false,
            measurement_feedback: false,
        }
    }
}

impl From<&PassConfig> for PassSet {
    fn from(cfg: &PassConfig) -> Self {
        Self {
            fluctuation: cfg.fluctuation,
            decoherence: cfg.decoherence,
            feedback: cfg.feedback,
            energy_correction: cfg.energy_correction,
            stochastic_kicks: cfg.stochastic_kicks,
            measurement_feedback: cfg.measurement_feedback,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub passes: PassSet, // which passes a tick runs
    pub diagnostic_every: Option<u64>, // emit total energy every k ticks, None = never
}

impl From<&EngineConfig> for Engine {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            passes: PassSet::from(&cfg.passes),
            diagnostic_every: cfg.diagnostic_every.filter(|&k| k > 0),
        }
    }
}
