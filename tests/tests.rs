use pqgsim::simulation::forces::ForceField;
use pqgsim::simulation::states::{EnsembleSpec, NVec3, Particle, ParticleEnsemble};
use pqgsim::simulation::params::{Parameters, MIN_SOFTENING};
use pqgsim::simulation::engine::{Engine, PassSet};
use pqgsim::simulation::stepper::{SimulationStepper, StepperState};
use pqgsim::{Scenario, ScenarioConfig, SimError};

/// Build a simple 2-particle ensemble separated along x-axis, at rest
pub fn two_body_ensemble(dist: f64, m1: f64, m2: f64) -> ParticleEnsemble {
    ParticleEnsemble::from_particles(vec![
        Particle::quantum([-dist / 2.0, 0.0, 0.0].into(), m1),
        Particle::quantum([dist / 2.0, 0.0, 0.0].into(), m2),
    ])
    .unwrap()
}

/// Default physics parameters for tests
pub fn test_params() -> Parameters {
    Parameters {
        G: 0.1,
        dt: 0.001,
        decoherence_rate: 0.01,
        fluctuation_scale: 1.0e-5,
        feedback_rate: 0.01,
        eps_min: 0.01,
        correction_factor: 1.0,
        measurement_gain: 0.1,
        seed: 42,
    }
}

/// Stepper with the given passes, initialized from `ens`
pub fn stepper_with(passes: PassSet, params: Parameters, ens: ParticleEnsemble) -> SimulationStepper {
    let mut stepper = SimulationStepper::new(Engine { passes, diagnostic_every: None }, params);
    stepper.initialize_with(ens).unwrap();
    stepper
}

/// Random ensemble with every pass on
pub fn random_stepper(n: usize, params: Parameters) -> SimulationStepper {
    let mut stepper = SimulationStepper::new(Engine::default(), params);
    stepper.initialize(&EnsembleSpec::new(n, 5.0, 1.0, 7)).unwrap();
    stepper
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_equal_masses_symmetric_kick() {
    let mut ens = two_body_ensemble(2.0, 1.0, 1.0);
    let p = test_params();

    ForceField::newtonian(p.G, p.eps_min).apply_gravity(&mut ens, p.dt);

    let (v0, v1) = (ens[0].v, ens[1].v);
    assert!(v0.x > 0.0, "particle 0 should move toward particle 1");
    assert_eq!(v0.x, -v1.x);
    assert_eq!((v0.y, v0.z, v1.y, v1.z), (0.0, 0.0, 0.0, 0.0));
}

#[test]
fn gravity_newton_third_law() {
    let mut ens = two_body_ensemble(1.0, 2.0, 3.0);
    let p = test_params();

    ForceField::newtonian(p.G, p.eps_min).apply_gravity(&mut ens, p.dt);

    let net = ens[0].v * ens[0].m + ens[1].v * ens[1].m;
    assert!(net.norm() < 1e-15, "Net momentum not zero: {:?}", net);
}

#[test]
fn gravity_inverse_square_law() {
    let mut ens_r = two_body_ensemble(1.0, 1.0, 1.0);
    let mut ens_2r = two_body_ensemble(2.0, 1.0, 1.0);
    let p = test_params();
    let field = ForceField::newtonian(p.G, p.eps_min);

    field.apply_gravity(&mut ens_r, p.dt);
    field.apply_gravity(&mut ens_2r, p.dt);

    let ratio = ens_r[0].v.norm() / ens_2r[0].v.norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected 4x, got {}", ratio);
}

#[test]
fn gravity_skips_coincident_pair() {
    let mut ens = ParticleEnsemble::from_particles(vec![
        Particle::quantum(NVec3::new(0.3, 0.3, 0.3), 1.0),
        Particle::quantum(NVec3::new(0.3, 0.3, 0.3), 1.0),
    ])
    .unwrap();
    let p = test_params();

    ForceField::newtonian(p.G, p.eps_min).apply_gravity(&mut ens, p.dt);

    for b in ens.iter() {
        assert!(b.v.iter().all(|c| c.is_finite()), "velocity blew up: {:?}", b.v);
        assert_eq!(b.v, NVec3::zeros());
    }
}

#[test]
fn coincident_particles_survive_full_ticks() {
    let ens = ParticleEnsemble::from_particles(vec![
        Particle::quantum(NVec3::zeros(), 1.0),
        Particle::quantum(NVec3::zeros(), 1.0),
        Particle::classical(NVec3::new(1.0, 0.0, 0.0), 1.0),
    ])
    .unwrap();
    let mut stepper = stepper_with(PassSet::default(), test_params(), ens);

    for _ in 0..10 {
        stepper.tick().unwrap();
    }
    for b in stepper.ensemble().unwrap().iter() {
        assert!(b.x.iter().chain(b.v.iter()).all(|c| c.is_finite()));
        assert!(b.coherence.is_finite());
    }
    assert!(stepper.total_energy().unwrap().is_finite());
}

#[test]
fn softening_floor_below_minimum_is_rejected() {
    let ens = two_body_ensemble(1e-110, 1.0, 1.0);
    let params = Parameters { eps_min: 1e-120, ..test_params() };
    let mut stepper = SimulationStepper::new(Engine { passes: PassSet::classical(), diagnostic_every: None }, params);

    assert!(matches!(stepper.initialize_with(ens), Err(SimError::InvalidConfig(_))));
    assert_eq!(stepper.state(), StepperState::Uninitialized);
}

#[test]
fn smallest_softening_floor_keeps_velocities_finite() {
    // Pair sits just above the floor: the largest kick the guard lets through
    let ens = ParticleEnsemble::from_particles(vec![
        Particle::classical(NVec3::zeros(), 1.0),
        Particle::classical(NVec3::new(1.5 * MIN_SOFTENING, 0.0, 0.0), 1.0),
    ])
    .unwrap();
    let params = Parameters { eps_min: MIN_SOFTENING, ..test_params() };
    let passes = PassSet { energy_correction: true, ..PassSet::classical() };
    let mut stepper = stepper_with(passes, params, ens);

    stepper.tick().unwrap();

    for b in stepper.ensemble().unwrap().iter() {
        assert!(b.v.iter().all(|c| c.is_finite()), "non-finite velocity: {:?}", b.v);
        assert!(b.x.iter().all(|c| c.is_finite()), "non-finite position: {:?}", b.x);
    }
}

// ==================================================================================
// Quantum state tests
// ==================================================================================

#[test]
fn decoherence_single_neighbor_arithmetic() {
    let ens = ParticleEnsemble::from_particles(vec![
        Particle::quantum(NVec3::zeros(), 1.0),
        Particle::classical(NVec3::new(1.0, 0.0, 0.0), 1.0),
    ])
    .unwrap();
    let params = Parameters { decoherence_rate: 0.01, dt: 0.01, ..test_params() };
    let passes = PassSet { decoherence: true, ..PassSet::classical() };
    let mut stepper = stepper_with(passes, params, ens);

    stepper.tick().unwrap();

    let c = stepper.ensemble().unwrap()[0].coherence;
    assert!((c - (1.0 - 0.0001)).abs() < 1e-12, "coherence = {c}");
    assert!(stepper.ensemble().unwrap()[0].is_quantum);
}

#[test]
fn decoherence_exhausted_flips_to_classical() {
    let ens = two_body_ensemble(0.1, 1.0, 1.0);
    // 100 curvature * 1000 rate * 0.001 dt drains 100 per tick
    let params = Parameters { decoherence_rate: 1000.0, ..test_params() };
    let passes = PassSet { decoherence: true, feedback: true, ..PassSet::classical() };
    let mut stepper = stepper_with(passes, params, ens);

    let snapshot = stepper.tick().unwrap();

    assert!(snapshot.particles.iter().all(|p| !p.is_quantum));
    for b in stepper.ensemble().unwrap().iter() {
        assert_eq!(b.coherence, 0.0);
        assert_eq!(b.curvature_influence, 0.0, "feedback must skip decohered particles");
    }
}

#[test]
fn feedback_uses_coherence_left_after_decoherence() {
    let ens = ParticleEnsemble::from_particles(vec![
        Particle::quantum(NVec3::zeros(), 1.0),
        Particle::classical(NVec3::new(1.0, 0.0, 0.0), 1.0),
    ])
    .unwrap();
    // curvature 1, drain 10 * 0.01 = 0.1 -> coherence 0.9 before feedback
    let params = Parameters { decoherence_rate: 10.0, dt: 0.01, feedback_rate: 0.1, ..test_params() };
    let passes = PassSet { decoherence: true, feedback: true, ..PassSet::classical() };
    let mut stepper = stepper_with(passes, params, ens);

    stepper.tick().unwrap();

    let p = &stepper.ensemble().unwrap()[0];
    assert!((p.coherence - 0.9).abs() < 1e-12, "coherence = {}", p.coherence);
    assert!((p.curvature_influence - 0.09).abs() < 1e-12, "influence = {}", p.curvature_influence);
}

#[test]
fn invariants_hold_over_many_ticks() {
    let params = Parameters { decoherence_rate: 2.0, feedback_rate: 0.3, dt: 0.01, ..test_params() };
    let mut stepper = random_stepper(150, params);
    let mut was_quantum: Vec<bool> = stepper.ensemble().unwrap().iter().map(|p| p.is_quantum).collect();

    for _ in 0..60 {
        let snapshot = stepper.tick().unwrap();
        assert_eq!(snapshot.particles.len(), 150);

        for (i, b) in stepper.ensemble().unwrap().iter().enumerate() {
            assert!((0.0..=1.0).contains(&b.coherence), "coherence {} at {i}", b.coherence);
            assert!(
                (-1.0..=1.0).contains(&b.curvature_influence),
                "curvature influence {} at {i}",
                b.curvature_influence
            );
            assert!(b.m > 0.0);
            assert!(was_quantum[i] || !b.is_quantum, "particle {i} returned to quantum");
            was_quantum[i] = b.is_quantum;
        }
    }
}

// ==================================================================================
// Energy tests
// ==================================================================================

#[test]
fn energy_stays_near_baseline_for_closed_pair() {
    let params = Parameters { G: 0.001, dt: 0.01, ..test_params() };
    let passes = PassSet { energy_correction: true, ..PassSet::classical() };
    let mut stepper = stepper_with(passes, params, two_body_ensemble(2.0, 1.0, 1.0));
    let seeded = stepper.total_energy().unwrap();

    assert!((seeded - (-0.001 / 2.0)).abs() < 1e-15, "seed energy {seeded}");

    for _ in 0..50 {
        stepper.tick().unwrap();
        let now = stepper.measure_energy().unwrap();
        assert!((now - seeded).abs() < 1e-6, "energy drifted to {now} from {seeded}");
    }
}

#[test]
fn baseline_follows_measured_energy() {
    let params = Parameters { G: 0.001, dt: 0.01, ..test_params() };
    let passes = PassSet { energy_correction: true, ..PassSet::classical() };
    let mut stepper = stepper_with(passes, params, two_body_ensemble(2.0, 1.0, 1.0));
    let seeded = stepper.total_energy().unwrap();

    stepper.tick().unwrap();

    // Baseline moves to the post-integration energy measured this tick
    let baseline = stepper.total_energy().unwrap();
    assert_ne!(baseline, seeded);
    assert!((baseline - seeded).abs() < 1e-9);
}

// ==================================================================================
// Determinism tests
// ==================================================================================

fn run_trajectory(passes: PassSet, ticks: usize) -> Vec<Vec<u64>> {
    let mut stepper = SimulationStepper::new(Engine { passes, diagnostic_every: None }, test_params());
    stepper.initialize(&EnsembleSpec::new(80, 5.0, 1.0, 1234)).unwrap();

    let mut out = Vec::new();
    for _ in 0..ticks {
        stepper.tick().unwrap();
        let bits = stepper
            .ensemble()
            .unwrap()
            .iter()
            .flat_map(|p| p.x.iter().chain(p.v.iter()).map(|c| c.to_bits()).collect::<Vec<_>>())
            .collect();
        out.push(bits);
    }
    out
}

#[test]
fn classical_runs_are_bit_identical() {
    let passes = PassSet { energy_correction: true, ..PassSet::classical() };
    assert_eq!(run_trajectory(passes, 25), run_trajectory(passes, 25));
}

#[test]
fn noisy_runs_are_bit_identical() {
    let passes = PassSet { stochastic_kicks: true, ..PassSet::default() };
    assert_eq!(run_trajectory(passes, 25), run_trajectory(passes, 25));
}

#[test]
fn fluctuation_moves_quantum_particles_only() {
    let params = Parameters { fluctuation_scale: 0.5, G: 0.0, ..test_params() };
    let ens = ParticleEnsemble::from_particles(vec![
        Particle::quantum(NVec3::new(-3.0, 0.0, 0.0), 1.0),
        Particle::classical(NVec3::new(3.0, 0.0, 0.0), 1.0),
    ])
    .unwrap();
    let passes = PassSet { fluctuation: true, ..PassSet::classical() };
    let mut stepper = stepper_with(passes, params, ens);

    let snapshot = stepper.tick().unwrap();

    let moved = snapshot.particles[0].x - NVec3::new(-3.0, 0.0, 0.0);
    assert!(moved.norm() > 0.0);
    assert!(moved.iter().all(|c| c.abs() <= 0.25));
    assert_eq!(snapshot.particles[1].x, NVec3::new(3.0, 0.0, 0.0));
}

// ==================================================================================
// Initialization / lifecycle tests
// ==================================================================================

#[test]
fn initialize_samples_inside_bounds() {
    let spec = EnsembleSpec { n: 500, bounds: 2.0, mass_scale: 3.0, velocity_range: 0.1, seed: 3 };
    let ens = ParticleEnsemble::initialize(&spec).unwrap();

    assert_eq!(ens.len(), 500);
    for p in ens.iter() {
        assert!(p.x.iter().all(|c| c.abs() <= 2.0));
        assert!(p.v.iter().all(|c| c.abs() <= 0.1));
        assert!(p.m > 0.0 && p.m <= 3.0);
        assert_eq!(p.curvature_influence, 0.0);
        if p.is_quantum {
            assert_eq!(p.coherence, 1.0);
        }
    }
    let quantum = ens.quantum_count();
    assert!(quantum > 150 && quantum < 350, "quantum draw far from 1/2: {quantum}");
}

#[test]
fn initialize_rejects_bad_config() {
    let bad_n = EnsembleSpec::new(0, 1.0, 1.0, 0);
    let bad_mass = EnsembleSpec::new(10, 1.0, 0.0, 0);
    assert!(matches!(ParticleEnsemble::initialize(&bad_n), Err(SimError::InvalidConfig(_))));
    assert!(matches!(ParticleEnsemble::initialize(&bad_mass), Err(SimError::InvalidConfig(_))));

    let mut stepper = SimulationStepper::new(Engine::default(), Parameters { dt: 0.0, ..test_params() });
    let err = stepper.initialize(&EnsembleSpec::new(10, 1.0, 1.0, 0)).unwrap_err();
    assert!(matches!(err, SimError::InvalidConfig(_)));
    assert_eq!(stepper.state(), StepperState::Uninitialized);
}

#[test]
fn explicit_particles_need_positive_mass() {
    let res = ParticleEnsemble::from_particles(vec![Particle::quantum(NVec3::zeros(), 0.0)]);
    assert!(matches!(res, Err(SimError::InvalidConfig(_))));
    assert!(ParticleEnsemble::from_particles(Vec::new()).is_err());
}

#[test]
fn explicit_particles_need_finite_state() {
    let nan_pos = Particle::quantum(NVec3::new(f64::NAN, 0.0, 0.0), 1.0);
    let inf_vel = Particle::quantum(NVec3::zeros(), 1.0).with_velocity(NVec3::new(0.0, f64::INFINITY, 0.0));

    assert!(matches!(ParticleEnsemble::from_particles(vec![nan_pos]), Err(SimError::InvalidConfig(_))));
    assert!(matches!(ParticleEnsemble::from_particles(vec![inf_vel]), Err(SimError::InvalidConfig(_))));
}

#[test]
fn scenario_with_non_finite_body_fails() {
    let yaml = r#"
ensemble:
  layout: explicit
bodies:
  - x: [.nan, 0.0, 0.0]
    m: 1.0
"#;
    let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
    assert!(matches!(Scenario::build_scenario(cfg), Err(SimError::InvalidConfig(_))));
}

#[test]
fn stepper_lifecycle() {
    let mut stepper = SimulationStepper::new(Engine::default(), test_params());
    assert_eq!(
        stepper.tick().unwrap_err(),
        SimError::InvalidState { op: "tick", state: StepperState::Uninitialized }
    );

    stepper.initialize(&EnsembleSpec::new(10, 1.0, 1.0, 0)).unwrap();
    assert_eq!(stepper.state(), StepperState::Ready);
    assert!(stepper.initialize(&EnsembleSpec::new(10, 1.0, 1.0, 0)).is_err());

    let first = stepper.tick().unwrap();
    let second = stepper.tick().unwrap();
    assert_eq!((first.tick, second.tick), (1, 2));
    assert_eq!(stepper.simulation().unwrap().tick, 2);
    assert_eq!(stepper.state(), StepperState::Stepping);

    let final_state = stepper.shutdown().unwrap();
    assert_eq!(final_state.tick, 2);
    assert_eq!(final_state.ensemble.len(), 10);
    assert_eq!(stepper.state(), StepperState::Terminated);
    assert_eq!(
        stepper.tick().unwrap_err(),
        SimError::InvalidState { op: "tick", state: StepperState::Terminated }
    );
}

#[test]
fn diagnostic_follows_cadence() {
    let engine = Engine { passes: PassSet::default(), diagnostic_every: Some(5) };
    let mut stepper = SimulationStepper::new(engine, test_params());
    stepper.initialize(&EnsembleSpec::new(20, 2.0, 1.0, 11)).unwrap();

    for _ in 0..4 {
        stepper.tick().unwrap();
    }
    assert!(stepper.last_diagnostic().is_none());

    for _ in 0..8 {
        stepper.tick().unwrap();
    }
    let d = stepper.last_diagnostic().unwrap();
    assert_eq!(d.tick, 10);
    assert!(d.total_energy.is_finite());
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn scenario_from_yaml_is_ready() {
    let yaml = r#"
engine:
  passes: { fluctuation: false, decoherence: false, feedback: false }
parameters:
  G: 0.001
ensemble:
  layout: explicit
bodies:
  - x: [-1.0, 0.0, 0.0]
    m: 1.0
  - x: [1.0, 0.0, 0.0]
    m: 1.0
"#;
    let cfg = ScenarioConfig::from_yaml_str(yaml).unwrap();
    let mut scenario = Scenario::build_scenario(cfg).unwrap();

    assert_eq!(scenario.stepper.state(), StepperState::Ready);
    assert!(scenario.edges.is_empty());
    let snapshot = scenario.stepper.tick().unwrap();
    assert_eq!(snapshot.particles.len(), 2);
}

#[test]
fn scenario_branching_keeps_edges() {
    let yaml = "ensemble: { layout: branching, depth: 2, fan_out: 3 }";
    let scenario = Scenario::build_scenario(ScenarioConfig::from_yaml_str(yaml).unwrap()).unwrap();

    assert_eq!(scenario.stepper.ensemble().unwrap().len(), 1 + 3 + 9);
    assert_eq!(scenario.edges.len(), 3 + 9);
}

#[test]
fn scenario_explicit_without_bodies_fails() {
    let cfg = ScenarioConfig::from_yaml_str("ensemble: { layout: explicit }").unwrap();
    assert!(matches!(Scenario::build_scenario(cfg), Err(SimError::InvalidConfig(_))));
}
