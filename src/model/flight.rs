use crate::config::FlightConfig;
use crate::errors::ConfigError;
use crate::utils::vector3d::Vector3D;

use super::{require_non_negative, require_positive};

/// Launch rail setup and integration limits.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightParameters {
    pub rail_length: f64,   // m
    pub inclination: f64,   // degrees from horizontal
    pub heading: f64,       // degrees from north
    pub max_time: f64,      // s
    pub max_time_step: f64, // s
    pub terminate_on_apogee: bool,
}

impl FlightParameters {
    /// Unit vector along the rail (x east, y north, z up).
    pub fn launch_direction(&self) -> Vector3D {
        let inclination = self.inclination.to_radians();
        let heading = self.heading.to_radians();
        Vector3D::new(
            inclination.cos() * heading.sin(),
            inclination.cos() * heading.cos(),
            inclination.sin(),
        )
    }
}

impl TryFrom<&FlightConfig> for FlightParameters {
    type Error = ConfigError;

    fn try_from(config: &FlightConfig) -> Result<Self, Self::Error> {
        let inclination = config.inclination;
        if !(inclination > 0.0 && inclination <= 90.0) {
            return Err(ConfigError::InvalidInclination(inclination));
        }
        Ok(FlightParameters {
            rail_length: require_non_negative("rail_length", config.rail_length)?,
            inclination,
            heading: config.heading,
            max_time: require_positive("max_time", config.max_time)?,
            max_time_step: require_positive("max_time_step", config.max_time_step)?,
            terminate_on_apogee: config.terminate_on_apogee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_launch_direction() {
        let flight = FlightParameters::try_from(&FlightConfig {
            inclination: 90.0,
            ..Default::default()
        })
        .unwrap();
        let direction = flight.launch_direction();
        assert_abs_diff_eq!(direction.z, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(direction.horizontal_magnitude(), 0.0, epsilon = 1e-12);

        let flight = FlightParameters::try_from(&FlightConfig {
            inclination: 45.0,
            heading: 90.0,
            ..Default::default()
        })
        .unwrap();
        let direction = flight.launch_direction();
        assert_abs_diff_eq!(direction.magnitude(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(direction.x, direction.z, epsilon = 1e-12);
        assert_abs_diff_eq!(direction.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flight_validation() {
        assert!(FlightParameters::try_from(&FlightConfig {
            max_time_step: 0.0,
            ..Default::default()
        })
        .is_err());
        assert!(matches!(
            FlightParameters::try_from(&FlightConfig {
                inclination: 95.0,
                ..Default::default()
            }),
            Err(ConfigError::InvalidInclination(_))
        ));
        assert!(FlightParameters::try_from(&FlightConfig {
            rail_length: -1.0,
            ..Default::default()
        })
        .is_err());
    }
}
