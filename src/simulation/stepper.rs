//! Tick orchestration
//!
//! `SimulationStepper` owns the `SimulationState` and runs one tick as a
//! fixed sequence of passes:
//!
//! fluctuation -> decoherence -> curvature feedback
//!   -> [stochastic kicks -> measurement feedback]
//!   -> gravity -> integration -> energy correction
//!
//! Decoherence and feedback see pre-gravity positions, and the correction
//! measures post-motion energy, so the order must not change. Each pass
//! finishes completely before the next one starts.
//!
//! Lifecycle: `Uninitialized -> Ready -> Stepping -> Terminated`

use log::{debug, info};

use crate::simulation::energy::{total_energy, EnergyConservationCorrector};
use crate::simulation::engine::Engine;
use crate::simulation::error::{SimError, SimResult};
use crate::simulation::forces::ForceField;
use crate::simulation::integrator::integrate_positions;
use crate::simulation::params::Parameters;
use crate::simulation::quantum::QuantumStateModel;
use crate::simulation::states::{EnsembleSpec, ParticleEnsemble, SimulationState, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    Uninitialized,
    Ready,
    Stepping,
    Terminated,
}

/// Total energy at a given tick, for a logging collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDiagnostic {
    pub tick: u64,
    pub total_energy: f64,
    pub quantum_count: usize,
}

pub struct SimulationStepper {
    engine: Engine,
    params: Parameters,
    phase: StepperState,
    sim: Option<SimulationState>,
    forces: ForceField,
    last_diagnostic: Option<EnergyDiagnostic>,
}

impl SimulationStepper {
    pub fn new(engine: Engine, params: Parameters) -> Self {
        let forces = ForceField::newtonian(params.G, params.eps_min);
        Self {
            engine,
            params,
            phase: StepperState::Uninitialized,
            sim: None,
            forces,
            last_diagnostic: None,
        }
    }

    pub fn state(&self) -> StepperState {
        self.phase
    }

    /// The running simulation, if any
    pub fn simulation(&self) -> Option<&SimulationState> {
        self.sim.as_ref()
    }

    pub fn ensemble(&self) -> Option<&ParticleEnsemble> {
        self.sim.as_ref().map(|s| &s.ensemble)
    }

    pub fn tick_count(&self) -> u64 {
        self.sim.as_ref().map_or(0, |s| s.tick)
    }

    /// Energy baseline carried between ticks
    pub fn total_energy(&self) -> Option<f64> {
        self.sim.as_ref().map(|s| s.total_energy)
    }

    /// Energy of the ensemble as it stands now
    pub fn measure_energy(&self) -> Option<f64> {
        self.sim
            .as_ref()
            .map(|s| total_energy(&s.ensemble, s.params.G, s.params.eps_min))
    }

    pub fn last_diagnostic(&self) -> Option<EnergyDiagnostic> {
        self.last_diagnostic
    }

    /// Sample a random ensemble and seed the energy baseline
    pub fn initialize(&mut self, spec: &EnsembleSpec) -> SimResult<()> {
        self.expect_phase("initialize", StepperState::Uninitialized)?;
        self.params.validate()?;
        let ensemble = ParticleEnsemble::initialize(spec)?;
        self.start(ensemble)
    }

    /// Start from an already-built ensemble and seed the energy baseline
    pub fn initialize_with(&mut self, ensemble: ParticleEnsemble) -> SimResult<()> {
        self.expect_phase("initialize", StepperState::Uninitialized)?;
        self.params.validate()?;
        self.start(ensemble)
    }

    fn start(&mut self, ensemble: ParticleEnsemble) -> SimResult<()> {
        let baseline = total_energy(&ensemble, self.params.G, self.params.eps_min);
        info!(
            "simulation ready: {} particles ({} quantum), baseline energy {:.6e}",
            ensemble.len(),
            ensemble.quantum_count(),
            baseline
        );

        self.sim = Some(SimulationState {
            ensemble,
            tick: 0,
            total_energy: baseline,
            params: self.params.clone(),
        });
        self.transition(StepperState::Ready);
        Ok(())
    }

    /// Run one full tick and return the resulting snapshot
    pub fn tick(&mut self) -> SimResult<Snapshot> {
        let sim = match (self.phase, self.sim.as_mut()) {
            (StepperState::Ready | StepperState::Stepping, Some(sim)) => sim,
            (state, _) => return Err(SimError::InvalidState { op: "tick", state }),
        };
        let passes = self.engine.passes;
        let params = &sim.params;

        // Quantum sub-passes
        let quantum = QuantumStateModel::new(params, sim.tick);
        if passes.fluctuation {
            quantum.apply_fluctuation(&mut sim.ensemble);
        }
        if passes.decoherence {
            let collapsed = quantum.apply_decoherence(&mut sim.ensemble);
            if collapsed > 0 {
                debug!("tick {}: {} particle(s) decohered", sim.tick, collapsed);
            }
        }
        if passes.feedback {
            quantum.apply_curvature_feedback(&mut sim.ensemble);
        }
        if passes.stochastic_kicks {
            quantum.apply_stochastic_kicks(&mut sim.ensemble);
        }
        if passes.measurement_feedback {
            quantum.apply_measurement_feedback(&mut sim.ensemble);
        }

        // Motion
        self.forces.apply_gravity(&mut sim.ensemble, params.dt);
        integrate_positions(&mut sim.ensemble, params.dt);

        // Energy
        if passes.energy_correction {
            let corrector = EnergyConservationCorrector {
                G: params.G,
                eps_min: params.eps_min,
                correction_factor: params.correction_factor,
            };
            let c = corrector.correct(&mut sim.ensemble, &mut sim.total_energy);
            debug!(
                "tick {}: measured energy {:.6e}, velocity nudge {:.3e}",
                sim.tick, c.measured, c.per_particle
            );
        }

        sim.tick += 1;

        if let Some(every) = self.engine.diagnostic_every {
            if sim.tick % every == 0 {
                let diagnostic = EnergyDiagnostic {
                    tick: sim.tick,
                    total_energy: total_energy(&sim.ensemble, params.G, params.eps_min),
                    quantum_count: sim.ensemble.quantum_count(),
                };
                info!(
                    "tick {}: total energy {:.6e}, {} quantum",
                    diagnostic.tick, diagnostic.total_energy, diagnostic.quantum_count
                );
                self.last_diagnostic = Some(diagnostic);
            }
        }

        let snapshot = Snapshot::of(sim);
        if self.phase == StepperState::Ready {
            self.transition(StepperState::Stepping);
        }
        Ok(snapshot)
    }

    /// Tear the simulation down; no further ticks are accepted
    pub fn shutdown(&mut self) -> Option<SimulationState> {
        if self.phase == StepperState::Terminated {
            return None;
        }
        if let Some(sim) = &self.sim {
            info!("simulation terminated after {} ticks", sim.tick);
        }
        self.transition(StepperState::Terminated);
        self.sim.take()
    }

    fn expect_phase(&self, op: &'static str, expected: StepperState) -> SimResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SimError::InvalidState { op, state: self.phase })
        }
    }

    fn transition(&mut self, next: StepperState) {
        debug!("stepper {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}
