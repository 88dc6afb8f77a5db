use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use launchsim::*;

#[derive(Parser)]
#[command(name = "launchsim")]
#[command(version)]
#[command(about = "Model rocket trajectory, stability and dispersion calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly one scenario
    Simulate {
        /// Scenario TOML file (defaults are used when omitted)
        scenario: Option<PathBuf>,

        /// Also write the full result as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// List every n-th trajectory sample
        #[arg(long)]
        trace: Option<usize>,
    },

    /// Estimate static stability of a scenario's rocket
    Stability {
        scenario: Option<PathBuf>,

        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Run a Monte Carlo dispersion batch
    Dispersion {
        scenario: Option<PathBuf>,

        /// Override the scenario's iteration count
        #[arg(short = 'n', long)]
        runs: Option<usize>,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Worker threads; one or none runs sequentially
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// List motors in the built-in catalog
    Motors {
        /// Impulse class letter, e.g. "F"
        #[arg(long)]
        impulse_class: Option<String>,

        #[arg(long)]
        manufacturer: Option<String>,

        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Standard atmosphere at an altitude
    Atmosphere {
        /// Altitude (meters)
        #[arg(short = 'a', long, default_value = "0.0")]
        altitude: f64,

        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn load_scenario(path: Option<&Path>, catalog: &MotorCatalog) -> Result<Scenario, ConfigError> {
    let config = match path {
        Some(path) => ScenarioConfig::load(path)?,
        None => {
            info!("No scenario file given, using defaults");
            ScenarioConfig::default()
        }
    };
    config.resolve(catalog)
}

fn service_for(scenario: &Scenario) -> TrajectoryService {
    match scenario.fidelity {
        Fidelity::Auto => TrajectoryService::detect(),
        Fidelity::Reduced => TrajectoryService::reduced_order(),
    }
}

fn write_json<T: Serialize + ?Sized>(path: Option<&Path>, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(path) = path {
        std::fs::write(path, serde_json::to_string_pretty(value)?)?;
        info!("Wrote JSON output to '{}'", path.display());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let cli = Cli::parse();
    let catalog = MotorCatalog::builtin()?;
    let mut telemetry = Telemetry::new();

    match cli.command {
        Commands::Simulate {
            scenario,
            json,
            trace,
        } => {
            let scenario = load_scenario(scenario.as_deref(), &catalog)?;
            let service = service_for(&scenario);
            let result = service.simulate(
                &scenario.rocket,
                &scenario.environment,
                &scenario.flight,
                scenario.output_rate,
            )?;

            write_json(json.as_deref(), &result)?;
            telemetry.record_flight(&result, trace);
        }
        Commands::Stability { scenario, json } => {
            let scenario = load_scenario(scenario.as_deref(), &catalog)?;
            let report = estimate_stability(&scenario.rocket);

            write_json(json.as_deref(), &report)?;
            telemetry.record_stability(&report);
        }
        Commands::Dispersion {
            scenario,
            runs,
            seed,
            workers,
            json,
        } => {
            let scenario = load_scenario(scenario.as_deref(), &catalog)?;
            let service = service_for(&scenario);
            let config = DispersionConfig {
                num_simulations: runs.unwrap_or(scenario.dispersion.num_simulations),
                ..scenario.dispersion
            };

            let statistics = match workers {
                Some(workers) if workers > 1 => run_dispersion_parallel(
                    &service,
                    &scenario.rocket,
                    &scenario.environment,
                    &scenario.flight,
                    scenario.output_rate,
                    &config,
                    workers,
                    seed,
                )?,
                _ => run_dispersion(
                    &service,
                    &scenario.rocket,
                    &scenario.environment,
                    &scenario.flight,
                    scenario.output_rate,
                    &config,
                    &mut StdRng::seed_from_u64(seed),
                )?,
            };

            write_json(json.as_deref(), &statistics)?;
            telemetry.record_dispersion(&statistics);
        }
        Commands::Motors {
            impulse_class,
            manufacturer,
            json,
        } => {
            let motors = catalog.filter(impulse_class.as_deref(), manufacturer.as_deref());

            write_json(json.as_deref(), &motors)?;
            telemetry.record_motors(&motors);
        }
        Commands::Atmosphere { altitude, json } => {
            let air = isa(altitude);

            write_json(json.as_deref(), &air)?;
            telemetry.record_atmosphere(&air);
        }
    }

    telemetry.display_data();
    Ok(())
}
