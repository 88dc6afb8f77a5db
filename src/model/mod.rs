pub mod environment;
pub mod flight;
pub mod motor;
pub mod parachute;
pub mod results;
pub mod rocket;
pub mod surfaces;

pub use environment::{AtmosphereModel, Environment};
pub use flight::FlightParameters;
pub use motor::{GrainGeometry, Motor, MotorKind, ThrustCurve};
pub use parachute::{Parachute, SensorNoise, Trigger};
pub use results::{
    DispersionStatistics, EventKind, FlightEvent, FlightSummary, SimulationResult,
    StabilityMargins, TrajectorySample,
};
pub use rocket::{DragCurve, Rocket};
pub use surfaces::{FinSet, NoseCone, NoseShape};

use crate::errors::ConfigError;

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
