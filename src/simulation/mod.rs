pub mod states;
pub mod params;
pub mod engine;
pub mod error;
pub mod noise;
pub mod forces;
pub mod quantum;
pub mod integrator;
pub mod energy;
pub mod stepper;
pub mod scenario;
pub mod branching;
