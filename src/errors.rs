use thiserror::Error;

/// Malformed input, reported before any simulation work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid thrust curve: {0}")]
    InvalidThrustCurve(String),

    #[error("Invalid drag curve '{name}': {reason}")]
    InvalidDragCurve { name: &'static str, reason: String },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("Fin set needs at least one fin, got {0}")]
    InvalidFinCount(u32),

    #[error("Parachute '{name}' has an unparseable trigger '{trigger}'")]
    InvalidParachuteTrigger { name: String, trigger: String },

    #[error("Parachute '{name}' noise must be [mean, std, correlation] with std >= 0 and |correlation| <= 1")]
    InvalidParachuteNoise { name: String },

    #[error("Wind direction must be within [0, 360), got {0}")]
    InvalidWindDirection(f64),

    #[error("Rail inclination must be within (0, 90] degrees, got {0}")]
    InvalidInclination(f64),

    #[error("Unknown catalog motor '{0}'")]
    UnknownMotor(String),

    #[error("Invalid dispersion parameter {field}: {value}")]
    InvalidDispersion { field: &'static str, value: f64 },

    #[error("Scenario parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Scenario read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised by a high-fidelity engine while building or integrating a flight.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Rocket never left the rail (thrust-to-weight {thrust_to_weight:.2})")]
    NoLiftoff { thrust_to_weight: f64 },

    #[error("Integration diverged at t={time:.3}s")]
    Diverged { time: f64 },

    #[error("t={0:.3}s lies outside the solution domain")]
    OutOfDomain(f64),

    #[error("{0}")]
    Engine(String),
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("No high-fidelity flight engine is available in this build")]
pub struct EngineUnavailable;
