use std::time::Instant;

use crate::simulation::engine::{Engine, PassSet};
use crate::simulation::forces::ForceField;
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec3, Particle, ParticleEnsemble};
use crate::simulation::stepper::SimulationStepper;

/// Helper to build a deterministic ensemble of size `n`, no rand needed
fn make_ensemble(n: usize) -> ParticleEnsemble {
    let particles = (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = NVec3::new(
                (i_f * 0.37).sin() * 5.0,
                (i_f * 0.13).cos() * 5.0,
                (i_f * 0.07).sin() * 5.0,
            );
            // Alternate quantum / classical so every pass has work
            if i % 2 == 0 {
                Particle::quantum(x, 1.0)
            } else {
                Particle::classical(x, 1.0)
            }
        })
        .collect();

    // n > 0 and masses are 1.0, so this cannot fail
    ParticleEnsemble::from_particles(particles).unwrap_or_else(|e| panic!("bench ensemble: {e}"))
}

/// Time the gravity pass alone for a range of n
pub fn bench_gravity() {
    // Different ensemble sizes to test
    let ns = [200, 400, 800, 1600, 3200, 6400];
    let params = Parameters::default();

    for n in ns {
        let mut ens = make_ensemble(n);
        let field = ForceField::newtonian(params.G, params.eps_min);

        // Warm up
        field.apply_gravity(&mut ens, params.dt);

        let t0 = Instant::now();
        field.apply_gravity(&mut ens, params.dt);
        let dt_gravity = t0.elapsed().as_secs_f64();

        println!("N = {n:5}, gravity = {:8.6} s", dt_gravity);
    }
}

/// Time a full tick (all passes) for a range of n
/// Paste output directly into a spreadsheet to graph
pub fn bench_tick() {
    println!("N,tick_ms,classical_tick_ms");

    for n in (200..=3200).step_by(200) {
        // Small n: average over a few ticks to smooth noise
        let ticks = if n <= 800 { 5 } else { 1 };

        let ms_full = time_ticks(n, PassSet::default(), ticks);
        let ms_classical = time_ticks(n, PassSet::classical(), ticks);

        println!("{},{:.6},{:.6}", n, ms_full, ms_classical);
    }
}

/// Average milliseconds per tick
fn time_ticks(n: usize, passes: PassSet, ticks: usize) -> f64 {
    let engine = Engine { passes, diagnostic_every: None };
    let mut stepper = SimulationStepper::new(engine, Parameters::default());
    if let Err(e) = stepper.initialize_with(make_ensemble(n)) {
        panic!("bench stepper: {e}");
    }

    let t0 = Instant::now();
    for _ in 0..ticks {
        if let Err(e) = stepper.tick() {
            panic!("bench tick: {e}");
        }
    }
    t0.elapsed().as_secs_f64() * 1000.0 / ticks as f64
}
