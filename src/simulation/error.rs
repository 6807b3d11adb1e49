//! Error type shared by every simulation component
//!
//! - `InvalidConfig` rejects a scenario before any particle exists
//! - `InvalidState` rejects an operation the stepper's lifecycle does not allow

use thiserror::Error;

use crate::simulation::stepper::StepperState;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot {op} while simulation is {state:?}")]
    InvalidState { op: &'static str, state: StepperState },
}

pub type SimResult<T> = std::result::Result<T, SimError>;

/// Shorthand used by the validators
pub(crate) fn invalid(msg: impl Into<String>) -> SimError {
    SimError::InvalidConfig(msg.into())
}
