//! Monte Carlo dispersion: repeat the trajectory run under normally
//! distributed wind, mass and (optionally) thrust perturbations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::config::DispersionConfig;
use crate::constants::MAX_LANDING_SAMPLES;
use crate::errors::ConfigError;
use crate::model::{DispersionStatistics, Environment, FlightParameters, Rocket};
use crate::trajectory_system::service::TrajectoryService;

/// Noise sources for one batch.
#[derive(Debug, Clone, Copy)]
struct Perturbations {
    wind_speed: Normal<f64>,
    wind_direction: Normal<f64>,
    mass: Normal<f64>,
    thrust: Option<Normal<f64>>,
}

impl Perturbations {
    fn new(config: &DispersionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let normal = |field: &'static str, std: f64| {
            Normal::new(0.0, std).map_err(|_| ConfigError::InvalidDispersion { field, value: std })
        };
        Ok(Perturbations {
            wind_speed: normal("wind_speed_std", config.wind_speed_std)?,
            wind_direction: normal("wind_direction_std", config.wind_direction_std)?,
            mass: normal("mass_std", config.mass_std)?,
            thrust: if config.thrust_std > 0.0 {
                Some(normal("thrust_std", config.thrust_std)?)
            } else {
                None
            },
        })
    }
}

/// Inputs shared by every iteration.
struct Baseline<'a> {
    service: &'a TrajectoryService,
    rocket: &'a Rocket,
    environment: &'a Environment,
    flight: &'a FlightParameters,
    output_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RunOutcome {
    apogee: f64,
    landing_position: [f64; 2],
}

impl<'a> Baseline<'a> {
    /// Draws one perturbed configuration and flies it. `None` marks an
    /// iteration dropped from the statistics.
    fn fly_perturbed<R: Rng + ?Sized>(
        &self,
        index: usize,
        perturbations: &Perturbations,
        rng: &mut R,
    ) -> Option<RunOutcome> {
        let wind_speed = self.environment.wind_speed + perturbations.wind_speed.sample(rng);
        let wind_direction =
            self.environment.wind_direction + perturbations.wind_direction.sample(rng);
        let mass = self.rocket.mass + perturbations.mass.sample(rng);
        let thrust_scale = perturbations
            .thrust
            .map(|thrust| 1.0 + thrust.sample(rng));

        let perturbed = self
            .environment
            .with_wind(wind_speed, wind_direction)
            .and_then(|environment| {
                let rocket = self.rocket.with_mass(mass)?;
                let rocket = match thrust_scale {
                    Some(scale) => rocket.with_thrust_scale(scale)?,
                    None => rocket,
                };
                Ok((rocket, environment))
            })
            .and_then(|(rocket, environment)| {
                self.service
                    .simulate(&rocket, &environment, self.flight, self.output_rate)
            });

        match perturbed {
            Ok(result) if result.success => Some(RunOutcome {
                apogee: result.summary.apogee,
                landing_position: result.summary.landing_position,
            }),
            Ok(result) => {
                warn!("Iteration {} dropped: {}", index, result.message);
                None
            }
            Err(e) => {
                warn!("Iteration {} dropped: {}", index, e);
                None
            }
        }
    }
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
}

/// Statistics over successful runs, in iteration order.
fn aggregate(num_requested: usize, outcomes: &[RunOutcome]) -> DispersionStatistics {
    if outcomes.is_empty() {
        return DispersionStatistics {
            success: false,
            num_requested,
            ..Default::default()
        };
    }

    let apogees: Vec<f64> = outcomes.iter().map(|run| run.apogee).collect();
    let radii: Vec<f64> = outcomes
        .iter()
        .map(|run| run.landing_position[0].hypot(run.landing_position[1]))
        .collect();

    let (apogee_min, apogee_max) = bounds(&apogees);
    let (radius_min, radius_max) = bounds(&radii);
    let (apogee_mean, apogee_std) = mean_and_std(&apogees);
    let (landing_dispersion_mean, landing_dispersion_std) = mean_and_std(&radii);

    DispersionStatistics {
        success: true,
        num_requested,
        num_simulations: outcomes.len(),
        // summation rounding can push a mean of identical values one ulp out
        apogee_mean: apogee_mean.clamp(apogee_min, apogee_max),
        apogee_std,
        apogee_min,
        apogee_max,
        landing_dispersion_mean: landing_dispersion_mean.clamp(radius_min, radius_max),
        landing_dispersion_std,
        landing_positions: outcomes
            .iter()
            .take(MAX_LANDING_SAMPLES)
            .map(|run| run.landing_position)
            .collect(),
    }
}

fn check_output_rate(output_rate: f64) -> Result<(), ConfigError> {
    if output_rate.is_finite() && output_rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field: "output_sampling_rate",
            value: output_rate,
        })
    }
}

/// Runs `config.num_simulations` perturbed flights drawing from `rng`.
/// Each iteration draws wind speed, wind direction, mass, then thrust.
/// Failed iterations are dropped; configuration errors are reported before
/// any flight runs.
pub fn run_dispersion<R: Rng + ?Sized>(
    service: &TrajectoryService,
    rocket: &Rocket,
    environment: &Environment,
    flight: &FlightParameters,
    output_rate: f64,
    config: &DispersionConfig,
    rng: &mut R,
) -> Result<DispersionStatistics, ConfigError> {
    let perturbations = Perturbations::new(config)?;
    check_output_rate(output_rate)?;
    info!("Running {} dispersion iterations", config.num_simulations);

    let baseline = Baseline {
        service,
        rocket,
        environment,
        flight,
        output_rate,
    };
    let outcomes: Vec<RunOutcome> = (0..config.num_simulations)
        .filter_map(|index| baseline.fly_perturbed(index, &perturbations, rng))
        .collect();

    let statistics = aggregate(config.num_simulations, &outcomes);
    info!(
        "Dispersion done: {}/{} runs succeeded",
        statistics.num_simulations, config.num_simulations
    );
    Ok(statistics)
}

/// Per-iteration generator seed, independent of which worker runs it.
fn iteration_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn worker(
    baseline: &Baseline,
    perturbations: &Perturbations,
    worker_id: usize,
    run_index: Arc<AtomicUsize>,
    num_runs: usize,
    seed: u64,
    tx_result: Sender<(usize, Option<RunOutcome>)>,
) {
    loop {
        let index = run_index.fetch_add(1, Ordering::Relaxed);
        if index >= num_runs {
            return;
        }

        let mut rng = StdRng::seed_from_u64(iteration_seed(seed, index));
        let outcome = baseline.fly_perturbed(index, perturbations, &mut rng);
        debug!("Iteration {} finished on worker {}", index, worker_id);

        if tx_result.send((index, outcome)).is_err() {
            return;
        }
    }
}

/// Same batch spread over `workers` threads. Every iteration seeds its own
/// generator from `(seed, index)`, so the result does not depend on the
/// worker count or scheduling.
#[allow(clippy::too_many_arguments)]
pub fn run_dispersion_parallel(
    service: &TrajectoryService,
    rocket: &Rocket,
    environment: &Environment,
    flight: &FlightParameters,
    output_rate: f64,
    config: &DispersionConfig,
    workers: usize,
    seed: u64,
) -> Result<DispersionStatistics, ConfigError> {
    let perturbations = Perturbations::new(config)?;
    check_output_rate(output_rate)?;
    let num_runs = config.num_simulations;
    let num_workers = workers.clamp(1, num_runs.max(1));
    info!(
        "Dispersion configuration: {} workers, {} runs, seed {}",
        num_workers, num_runs, seed
    );

    let baseline = Baseline {
        service,
        rocket,
        environment,
        flight,
        output_rate,
    };
    let run_index = Arc::new(AtomicUsize::new(0));
    let (tx_result, rx_result) = std::sync::mpsc::channel();

    let mut results: Vec<(usize, Option<RunOutcome>)> = std::thread::scope(|scope| {
        for worker_id in 0..num_workers {
            let run_index = run_index.clone();
            let tx_result = tx_result.clone();
            let baseline = &baseline;
            let perturbations = &perturbations;
            scope.spawn(move || {
                worker(
                    baseline,
                    perturbations,
                    worker_id,
                    run_index,
                    num_runs,
                    seed,
                    tx_result,
                )
            });
        }
        drop(tx_result);

        rx_result.iter().collect()
    });

    results.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<RunOutcome> = results.into_iter().filter_map(|(_, outcome)| outcome).collect();

    let statistics = aggregate(num_runs, &outcomes);
    info!(
        "Dispersion done: {}/{} runs succeeded",
        statistics.num_simulations, num_runs
    );
    Ok(statistics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvironmentConfig, FlightConfig, RocketConfig};
    use approx::assert_relative_eq;

    fn inputs() -> (Rocket, Environment, FlightParameters) {
        (
            Rocket::try_from(&RocketConfig::default()).unwrap(),
            Environment::try_from(&EnvironmentConfig::default()).unwrap(),
            FlightParameters::try_from(&FlightConfig::default()).unwrap(),
        )
    }

    #[test]
    fn test_mean_and_population_std() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(std, 2.0);
    }

    #[test]
    fn test_aggregate_truncates_in_iteration_order() {
        let outcomes: Vec<RunOutcome> = (0..150)
            .map(|i| RunOutcome {
                apogee: i as f64,
                landing_position: [i as f64, 0.0],
            })
            .collect();
        let statistics = aggregate(150, &outcomes);

        assert_eq!(statistics.num_simulations, 150);
        assert_eq!(statistics.landing_positions.len(), 100);
        assert_eq!(statistics.landing_positions[0], [0.0, 0.0]);
        assert_eq!(statistics.landing_positions[99], [99.0, 0.0]);
        assert_eq!(statistics.apogee_min, 0.0);
        assert_eq!(statistics.apogee_max, 149.0);
    }

    #[test]
    fn test_mean_of_identical_apogees_stays_in_bounds() {
        let outcomes = [RunOutcome {
            apogee: 0.1,
            landing_position: [0.1, 0.0],
        }; 3];
        let statistics = aggregate(3, &outcomes);
        assert!(statistics.apogee_min <= statistics.apogee_mean);
        assert!(statistics.apogee_mean <= statistics.apogee_max);
        assert_eq!(statistics.apogee_mean, 0.1);
        assert_eq!(statistics.landing_dispersion_mean, 0.1);
    }

    #[test]
    fn test_unperturbed_batches_keep_mean_within_bounds() {
        let (rocket, environment, flight) = inputs();
        let service = TrajectoryService::reduced_order();
        let config = DispersionConfig {
            wind_speed_std: 0.0,
            wind_direction_std: 0.0,
            mass_std: 0.0,
            thrust_std: 0.0,
            ..Default::default()
        };

        for num_simulations in 1..=100 {
            let config = DispersionConfig {
                num_simulations,
                ..config
            };
            let statistics = run_dispersion(
                &service,
                &rocket,
                &environment,
                &flight,
                20.0,
                &config,
                &mut StdRng::seed_from_u64(num_simulations as u64),
            )
            .unwrap();

            assert_eq!(statistics.num_simulations, num_simulations);
            assert!(statistics.apogee_min <= statistics.apogee_mean);
            assert!(statistics.apogee_mean <= statistics.apogee_max);
            assert_eq!(statistics.apogee_min, statistics.apogee_max);
        }
    }

    #[test]
    fn test_aggregate_radius() {
        let outcomes = [
            RunOutcome {
                apogee: 100.0,
                landing_position: [3.0, 4.0],
            },
            RunOutcome {
                apogee: 100.0,
                landing_position: [-6.0, 8.0],
            },
        ];
        let statistics = aggregate(2, &outcomes);
        assert_relative_eq!(statistics.landing_dispersion_mean, 7.5);
        assert_relative_eq!(statistics.landing_dispersion_std, 2.5);
        assert_relative_eq!(statistics.apogee_std, 0.0);
    }

    #[test]
    fn test_zero_iterations() {
        let (rocket, environment, flight) = inputs();
        let config = DispersionConfig {
            num_simulations: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let statistics = run_dispersion(
            &TrajectoryService::reduced_order(),
            &rocket,
            &environment,
            &flight,
            100.0,
            &config,
            &mut rng,
        )
        .unwrap();

        assert!(!statistics.success);
        assert_eq!(statistics.num_simulations, 0);
        assert_eq!(statistics.apogee_mean, 0.0);
        assert!(statistics.landing_positions.is_empty());
    }

    #[test]
    fn test_invalid_mass_draws_are_dropped() {
        let (rocket, environment, flight) = inputs();
        // mass 0.5 with std 50 goes negative about half the time
        let config = DispersionConfig {
            num_simulations: 40,
            mass_std: 50.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let statistics = run_dispersion(
            &TrajectoryService::reduced_order(),
            &rocket,
            &environment,
            &flight,
            20.0,
            &config,
            &mut rng,
        )
        .unwrap();

        assert!(statistics.num_simulations < 40);
        assert!(statistics.num_simulations > 0);
        assert_eq!(statistics.num_requested, 40);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let (rocket, environment, flight) = inputs();
        let service = TrajectoryService::reduced_order();
        let config = DispersionConfig {
            num_simulations: 20,
            thrust_std: 0.05,
            ..Default::default()
        };

        let first = run_dispersion(
            &service,
            &rocket,
            &environment,
            &flight,
            20.0,
            &config,
            &mut StdRng::seed_from_u64(11),
        )
        .unwrap();
        let second = run_dispersion(
            &service,
            &rocket,
            &environment,
            &flight,
            20.0,
            &config,
            &mut StdRng::seed_from_u64(11),
        )
        .unwrap();

        assert_eq!(first, second);
        assert!(first.apogee_std > 0.0);
    }

    #[test]
    fn test_parallel_result_is_independent_of_worker_count() {
        let (rocket, environment, flight) = inputs();
        let service = TrajectoryService::reduced_order();
        let config = DispersionConfig {
            num_simulations: 30,
            ..Default::default()
        };

        let single =
            run_dispersion_parallel(&service, &rocket, &environment, &flight, 20.0, &config, 1, 5)
                .unwrap();
        let many =
            run_dispersion_parallel(&service, &rocket, &environment, &flight, 20.0, &config, 4, 5)
                .unwrap();

        assert_eq!(single, many);
        assert_eq!(single.num_simulations, 30);
    }

    #[test]
    fn test_bad_config_rejected_up_front() {
        let (rocket, environment, flight) = inputs();
        let config = DispersionConfig {
            wind_speed_std: -1.0,
            ..Default::default()
        };
        let result = run_dispersion(
            &TrajectoryService::reduced_order(),
            &rocket,
            &environment,
            &flight,
            100.0,
            &config,
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDispersion { field: "wind_speed_std", .. })
        ));
    }
}
