pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{
    EnsembleSpec, NVec3, Particle, ParticleEnsemble, ParticleView, SimulationState, Snapshot,
};
pub use simulation::params::Parameters;
pub use simulation::engine::{Engine, PassSet};
pub use simulation::error::{SimError, SimResult};
pub use simulation::forces::{AccelSet3, Acceleration3, ForceField, NewtonianGravity3};
pub use simulation::quantum::QuantumStateModel;
pub use simulation::integrator::integrate_positions;
pub use simulation::energy::{total_energy, EnergyConservationCorrector};
pub use simulation::stepper::{EnergyDiagnostic, SimulationStepper, StepperState};
pub use simulation::scenario::Scenario;
pub use simulation::branching::{BranchLayout, BranchSpec};

pub use configuration::config::{
    BodyConfig, EngineConfig, EnsembleConfig, LayoutConfig, ParametersConfig, PassConfig, ScenarioConfig,
};

pub use benchmark::benchmark::{bench_gravity, bench_tick};
