use std::fmt;

use crate::config::ParachuteConfig;
use crate::errors::ConfigError;

use super::{require_non_negative, require_positive};

/// When a parachute deploys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Descending vertical velocity.
    Apogee,
    /// Descending and below this altitude above the launch site (m).
    AltitudeBelow(f64),
}

impl Trigger {
    /// Parses the exact literal `apogee` or an altitude in meters.
    pub fn parse(name: &str, source: &str) -> Result<Self, ConfigError> {
        if source == "apogee" {
            return Ok(Trigger::Apogee);
        }
        match source.trim().parse::<f64>() {
            Ok(altitude) if altitude.is_finite() => Ok(Trigger::AltitudeBelow(altitude)),
            _ => Err(ConfigError::InvalidParachuteTrigger {
                name: name.to_string(),
                trigger: source.to_string(),
            }),
        }
    }

    /// Whether the trigger fires. Velocity is checked first; an ascending
    /// vehicle never deploys.
    pub fn is_satisfied(&self, altitude: f64, vertical_velocity: f64) -> bool {
        if vertical_velocity >= 0.0 {
            return false;
        }
        match self {
            Trigger::Apogee => true,
            Trigger::AltitudeBelow(threshold) => altitude < *threshold,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Apogee => write!(f, "apogee"),
            Trigger::AltitudeBelow(altitude) => write!(f, "{} m", altitude),
        }
    }
}

/// Noise on the pressure signal a deployment trigger senses (Pa).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorNoise {
    pub mean: f64,
    pub std_dev: f64,
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parachute {
    pub name: String,
    pub cd_s: f64, // m²
    pub trigger: Trigger,
    pub sampling_rate: f64, // Hz
    pub lag: f64,           // s
    pub noise: SensorNoise,
}

impl TryFrom<&ParachuteConfig> for Parachute {
    type Error = ConfigError;

    fn try_from(config: &ParachuteConfig) -> Result<Self, Self::Error> {
        let [mean, std_dev, correlation] = config.noise;
        if !mean.is_finite()
            || !std_dev.is_finite()
            || std_dev < 0.0
            || !(-1.0..=1.0).contains(&correlation)
        {
            return Err(ConfigError::InvalidParachuteNoise {
                name: config.name.clone(),
            });
        }

        Ok(Parachute {
            name: config.name.clone(),
            cd_s: require_positive("parachute cd_s", config.cd_s)?,
            trigger: Trigger::parse(&config.name, &config.trigger)?,
            sampling_rate: require_positive("parachute sampling_rate", config.sampling_rate)?,
            lag: require_non_negative("parachute lag", config.lag)?,
            noise: SensorNoise {
                mean,
                std_dev,
                correlation,
            },
        })
    }
}
