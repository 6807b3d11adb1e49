//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds the constants every pass reads:
//! - gravitational constant and step size (`G`, `dt`),
//! - quantum model rates (decoherence, fluctuation, feedback),
//! - softening floor `eps_min` shared by every pairwise computation,
//! - energy correction factor and measurement feedback gain,
//! - random seed keying the per-particle noise streams

use crate::simulation::error::{invalid, SimResult};

/// Smallest accepted softening floor; below it `G m^2 / d^3` can overflow
pub const MIN_SOFTENING: f64 = 1.0e-6;

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub G: f64, // gravitational constant
    pub dt: f64, // time step
    pub decoherence_rate: f64, // coherence lost per unit curvature per unit time
    pub fluctuation_scale: f64, // positional noise amplitude per unit mass
    pub feedback_rate: f64, // curvature influence gained per unit coherence
    pub eps_min: f64, // softening floor, pairs closer than this are skipped
    pub correction_factor: f64, // scales the per-particle energy correction
    pub measurement_gain: f64, // velocity feedback toward position, optional pass
    pub seed: u64, // deterministic seed
}

impl Default for Parameters {
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

impl Parameters {
    /// Reject anything that would let a pass produce NaN or run backwards
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(invalid(format!("timestep must be positive, got {}", self.dt)));
        }
        if !(self.eps_min >= MIN_SOFTENING) || !self.eps_min.is_finite() {
            return Err(invalid(format!(
                "softening floor must be at least {MIN_SOFTENING:e}, got {}",
                self.eps_min
            )));
        }

        let finite = [
            ("G", self.G),
            ("decoherence_rate", self.decoherence_rate),
            ("fluctuation_scale", self.fluctuation_scale),
            ("feedback_rate", self.feedback_rate),
            ("correction_factor", self.correction_factor),
            ("measurement_gain", self.measurement_gain),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {value}")));
            }
        }
        if self.decoherence_rate < 0.0 {
            return Err(invalid("decoherence_rate must be >= 0"));
        }
        if self.fluctuation_scale < 0.0 {
            return Err(invalid("fluctuation_scale must be >= 0"));
        }
        Ok(())
    }
}
