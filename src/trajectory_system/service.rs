use log::{info, warn};

use crate::errors::ConfigError;
use crate::model::{Environment, FlightParameters, Rocket, SimulationResult};

use super::engine::{detect_engine, run_high_fidelity, FlightEngine};
use super::fallback::run_fallback;

/// Where trajectories come from, chosen once at startup.
pub enum TrajectoryProvider {
    HighFidelity(Box<dyn FlightEngine>),
    ReducedOrder,
}

impl TrajectoryProvider {
    pub fn detect() -> Self {
        match detect_engine() {
            Ok(engine) => {
                info!("Using high-fidelity engine '{}'", engine.name());
                TrajectoryProvider::HighFidelity(engine)
            }
            Err(e) => {
                warn!("{}; falling back to reduced-order estimates", e);
                TrajectoryProvider::ReducedOrder
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TrajectoryProvider::HighFidelity(engine) => engine.name(),
            TrajectoryProvider::ReducedOrder => "reduced-order",
        }
    }
}

/// Single entry point for trajectory runs. Both providers return the same
/// result shape; only `message` tells them apart.
pub struct TrajectoryService {
    provider: TrajectoryProvider,
}

impl TrajectoryService {
    pub fn new(provider: TrajectoryProvider) -> Self {
        TrajectoryService { provider }
    }

    pub fn detect() -> Self {
        TrajectoryService::new(TrajectoryProvider::detect())
    }

    pub fn reduced_order() -> Self {
        TrajectoryService::new(TrajectoryProvider::ReducedOrder)
    }

    pub fn provider(&self) -> &TrajectoryProvider {
        &self.provider
    }

    /// Runs one flight. Only an invalid `output_rate` is an error; engine
    /// failures come back as an unsuccessful result.
    pub fn simulate(
        &self,
        rocket: &Rocket,
        environment: &Environment,
        flight: &FlightParameters,
        output_rate: f64,
    ) -> Result<SimulationResult, ConfigError> {
        if !(output_rate.is_finite() && output_rate > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "output_sampling_rate",
                value: output_rate,
            });
        }

        Ok(match &self.provider {
            TrajectoryProvider::HighFidelity(engine) => {
                run_high_fidelity(engine.as_ref(), rocket, environment, flight, output_rate)
            }
            TrajectoryProvider::ReducedOrder => run_fallback(rocket, environment, flight, output_rate),
        })
    }
}
