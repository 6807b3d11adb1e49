use pqgsim::{Scenario, ScenarioConfig};
use pqgsim::{bench_gravity, bench_tick};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pqgsim", about = "Particle ensemble with gravity, fluctuation and decoherence")]
struct Args {
    /// Scenario file under `scenarios/`
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Run the timing sweep instead of a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path)
        .with_context(|| format!("failed to open scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("failed to parse scenario {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.bench {
        bench_gravity();
        bench_tick();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let mut scenario = Scenario::build_scenario(scenario_cfg)?;
    info!("loaded {} ({} edges)", args.file_name, scenario.edges.len());

    let mut last = None;
    for _ in 0..args.ticks {
        last = Some(scenario.stepper.tick()?);
    }

    if let Some(snapshot) = last {
        let quantum = snapshot.particles.iter().filter(|p| p.is_quantum).count();
        let energy = scenario.stepper.measure_energy().unwrap_or(f64::NAN);
        println!(
            "tick {}: {} / {} quantum, total energy {:.6e}",
            snapshot.tick,
            quantum,
            snapshot.particles.len(),
            energy
        );
    }

    scenario.stepper.shutdown();
    Ok(())
}
