use serde::{Deserialize, Serialize};

use crate::config::EnvironmentConfig;
use crate::errors::ConfigError;
use crate::utils::vector3d::Vector3D;

use super::require_non_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AtmosphereModel {
    #[default]
    #[serde(alias = "standard_atmosphere")]
    Standard,
    #[serde(alias = "custom_atmosphere")]
    Custom,
    #[serde(alias = "Forecast")]
    Forecast,
    #[serde(alias = "Reanalysis")]
    Reanalysis,
}

impl AtmosphereModel {
    /// Profiles that would come from a weather service rather than a formula.
    pub fn is_externally_sourced(&self) -> bool {
        matches!(self, AtmosphereModel::Forecast | AtmosphereModel::Reanalysis)
    }
}

/// Launch site and surface wind.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64, // m ASL
    pub date: Option<String>,
    pub atmosphere: AtmosphereModel,
    pub wind_speed: f64,     // m/s
    pub wind_direction: f64, // degrees, [0, 360)
}

impl Environment {
    /// Copy with a different wind. A negative speed is folded into the
    /// opposite direction and the direction is wrapped into [0, 360).
    pub fn with_wind(&self, speed: f64, direction: f64) -> Result<Self, ConfigError> {
        let (speed, direction) = if speed < 0.0 {
            (-speed, direction + 180.0)
        } else {
            (speed, direction)
        };
        let mut direction = direction.rem_euclid(360.0);
        if direction >= 360.0 {
            // rem_euclid of a tiny negative value rounds up to 360
            direction = 0.0;
        }
        let environment = Environment {
            wind_speed: speed,
            wind_direction: direction,
            ..self.clone()
        };
        environment.validate()?;
        Ok(environment)
    }

    /// Wind velocity in the launch frame (x east, y north).
    pub fn wind_vector(&self) -> Vector3D {
        let direction = self.wind_direction.to_radians();
        Vector3D::new(
            self.wind_speed * direction.cos(),
            self.wind_speed * direction.sin(),
            0.0,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("wind_speed", self.wind_speed)?;
        if !(0.0..360.0).contains(&self.wind_direction) {
            return Err(ConfigError::InvalidWindDirection(self.wind_direction));
        }
        Ok(())
    }
}

impl TryFrom<&EnvironmentConfig> for Environment {
    type Error = ConfigError;

    fn try_from(config: &EnvironmentConfig) -> Result<Self, Self::Error> {
        let environment = Environment {
            latitude: config.latitude,
            longitude: config.longitude,
            elevation: config.elevation,
            date: config.date.clone(),
            atmosphere: config.atmosphere,
            wind_speed: config.wind_speed,
            wind_direction: config.wind_direction,
        };
        environment.validate()?;
        Ok(environment)
    }
}
