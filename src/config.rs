//! Scenario files: TOML input describing one launch, mirroring the request
//! schema of the simulation service. Every field has a default so partial
//! scenarios are valid; invariants are checked when the sections are turned
//! into model values.

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::catalog::MotorCatalog;
use crate::constants::DEFAULT_OUTPUT_RATE;
use crate::errors::ConfigError;
use crate::model::{
    AtmosphereModel, Environment, FlightParameters, MotorKind, NoseShape, Rocket,
};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub date: Option<String>,
    #[serde(alias = "atmosphere_type")]
    pub atmosphere: AtmosphereModel,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            latitude: 32.990254,
            longitude: -106.974998,
            elevation: 1400.0,
            date: None,
            atmosphere: AtmosphereModel::Standard,
            wind_speed: 0.0,
            wind_direction: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotorConfig {
    #[serde(alias = "motor_type")]
    pub kind: MotorKind,
    #[serde(alias = "thrust_source")]
    pub catalog_id: Option<String>,
    pub burn_time: f64,
    pub total_impulse: f64,
    pub avg_thrust: f64,
    pub propellant_mass: f64,
    pub dry_mass: f64,
    pub nozzle_radius: f64,
    pub throat_radius: f64,
    pub grain_outer_radius: f64,
    pub grain_initial_inner_radius: f64,
    pub grain_initial_height: f64,
    pub grain_number: u32,
    pub grain_separation: f64,
    pub grain_density: f64,
    pub thrust_curve: Option<Vec<[f64; 2]>>,
}

impl Default for MotorConfig {
    fn default() -> Self {
        MotorConfig {
            kind: MotorKind::Solid,
            catalog_id: None,
            burn_time: 1.5,
            total_impulse: 100.0,
            avg_thrust: 50.0,
            propellant_mass: 0.05,
            dry_mass: 0.03,
            nozzle_radius: 0.015,
            throat_radius: 0.005,
            grain_outer_radius: 0.02,
            grain_initial_inner_radius: 0.008,
            grain_initial_height: 0.05,
            grain_number: 1,
            grain_separation: 0.002,
            grain_density: 1700.0,
            thrust_curve: None,
        }
    }
}

impl MotorConfig {
    /// Replaces performance and mass fields with the catalog entry named by
    /// `catalog_id`. Grain and nozzle geometry stay as configured.
    pub fn resolve_catalog(&self, catalog: &MotorCatalog) -> Result<MotorConfig, ConfigError> {
        let Some(id) = &self.catalog_id else {
            return Ok(self.clone());
        };
        let descriptor = catalog
            .get(id)
            .ok_or_else(|| ConfigError::UnknownMotor(id.clone()))?;

        Ok(MotorConfig {
            burn_time: descriptor.burn_time,
            total_impulse: descriptor.total_impulse,
            avg_thrust: descriptor.avg_thrust,
            propellant_mass: descriptor.propellant_mass_kg(),
            dry_mass: descriptor.dry_mass_kg(),
            thrust_curve: Some(descriptor.thrust_curve.clone()),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoseConfig {
    pub length: f64,
    pub kind: NoseShape,
    pub base_radius: Option<f64>,
}

impl Default for NoseConfig {
    fn default() -> Self {
        NoseConfig {
            length: 0.1,
            kind: NoseShape::Ogive,
            base_radius: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FinConfig {
    pub n: u32,
    pub root_chord: f64,
    pub tip_chord: f64,
    pub span: f64,
    pub sweep_length: Option<f64>,
    pub sweep_angle: Option<f64>,
    pub cant_angle: f64,
    pub position: f64,
}

impl Default for FinConfig {
    fn default() -> Self {
        FinConfig {
            n: 3,
            root_chord: 0.08,
            tip_chord: 0.03,
            span: 0.06,
            sweep_length: None,
            sweep_angle: None,
            cant_angle: 0.0,
            position: -0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParachuteConfig {
    pub name: String,
    pub cd_s: f64,
    pub trigger: String,
    pub sampling_rate: f64,
    pub lag: f64,
    pub noise: [f64; 3],
}

impl Default for ParachuteConfig {
    fn default() -> Self {
        ParachuteConfig {
            name: "Main".to_string(),
            cd_s: 1.0,
            trigger: "apogee".to_string(),
            sampling_rate: 100.0,
            lag: 1.5,
            noise: [0.0, 8.3, 0.5],
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RocketConfig {
    pub mass: f64,
    pub radius: f64,
    pub inertia_i: f64,
    pub inertia_z: f64,
    pub center_of_mass: f64,
    pub power_off_drag: Option<Vec<[f64; 2]>>,
    pub power_on_drag: Option<Vec<[f64; 2]>>,
    pub nose: Option<NoseConfig>,
    pub fins: Option<FinConfig>,
    pub motor: MotorConfig,
    pub parachutes: Vec<ParachuteConfig>,
}

impl Default for RocketConfig {
    fn default() -> Self {
        RocketConfig {
            mass: 0.5,
            radius: 0.025,
            inertia_i: 0.01,
            inertia_z: 0.001,
            center_of_mass: 0.3,
            power_off_drag: None,
            power_on_drag: None,
            nose: None,
            fins: None,
            motor: MotorConfig::default(),
            parachutes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlightConfig {
    pub rail_length: f64,
    pub inclination: f64,
    pub heading: f64,
    pub max_time: f64,
    pub max_time_step: f64,
    pub terminate_on_apogee: bool,
}

impl Default for FlightConfig {
    fn default() -> Self {
        FlightConfig {
            rail_length: 2.0,
            inclination: 85.0,
            heading: 0.0,
            max_time: 600.0,
            max_time_step: 0.01,
            terminate_on_apogee: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispersionConfig {
    pub num_simulations: usize,
    pub wind_speed_std: f64,
    pub wind_direction_std: f64,
    pub mass_std: f64,
    pub thrust_std: f64,
}

impl Default for DispersionConfig {
    fn default() -> Self {
        DispersionConfig {
            num_simulations: 100,
            wind_speed_std: 2.0,
            wind_direction_std: 15.0,
            mass_std: 0.01,
            thrust_std: 0.0,
        }
    }
}

impl DispersionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("wind_speed_std", self.wind_speed_std),
            ("wind_direction_std", self.wind_direction_std),
            ("mass_std", self.mass_std),
            ("thrust_std", self.thrust_std),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDispersion { field, value });
            }
        }
        Ok(())
    }
}

/// Which trajectory provider a scenario asks for.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Whatever provider was detected at startup.
    #[default]
    Auto,
    /// Always the reduced-order estimate.
    Reduced,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub output_sampling_rate: f64,
    pub fidelity: Fidelity,
    pub environment: EnvironmentConfig,
    pub rocket: RocketConfig,
    pub flight: FlightConfig,
    pub dispersion: DispersionConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            output_sampling_rate: DEFAULT_OUTPUT_RATE,
            fidelity: Fidelity::Auto,
            environment: EnvironmentConfig::default(),
            rocket: RocketConfig::default(),
            flight: FlightConfig::default(),
            dispersion: DispersionConfig::default(),
        }
    }
}

/// A fully validated scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub output_rate: f64,
    pub fidelity: Fidelity,
    pub environment: Environment,
    pub rocket: Rocket,
    pub flight: FlightParameters,
    pub dispersion: DispersionConfig,
}

impl ScenarioConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Reading scenario from '{}'", path.display());
        let source = fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    /// Validates every section and resolves catalog motors.
    pub fn resolve(&self, catalog: &MotorCatalog) -> Result<Scenario, ConfigError> {
        if !(self.output_sampling_rate.is_finite() && self.output_sampling_rate > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "output_sampling_rate",
                value: self.output_sampling_rate,
            });
        }
        self.dispersion.validate()?;

        let rocket = RocketConfig {
            motor: self.rocket.motor.resolve_catalog(catalog)?,
            ..self.rocket.clone()
        };

        Ok(Scenario {
            output_rate: self.output_sampling_rate,
            fidelity: self.fidelity,
            environment: Environment::try_from(&self.environment)?,
            rocket: Rocket::try_from(&rocket)?,
            flight: FlightParameters::try_from(&self.flight)?,
            dispersion: self.dispersion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trigger;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_scenario_uses_defaults() {
        let config = ScenarioConfig::from_toml("").unwrap();
        assert_eq!(config, ScenarioConfig::default());
        assert_eq!(config.flight.inclination, 85.0);
        assert_eq!(config.rocket.motor.avg_thrust, 50.0);
    }

    #[test]
    fn test_full_scenario_parses() {
        let source = r#"
            output_sampling_rate = 50
            fidelity = "reduced"

            [environment]
            elevation = 0
            atmosphere = "custom"
            wind_speed = 3.5
            wind_direction = 90

            [rocket]
            mass = 1.2
            radius = 0.04

            [rocket.motor]
            burn_time = 2.0
            avg_thrust = 80
            thrust_curve = [[0, 0], [0.1, 120], [1.9, 60], [2.0, 0]]

            [rocket.fins]
            n = 4
            span = 0.08

            [[rocket.parachutes]]
            name = "Drogue"
            trigger = "apogee"

            [[rocket.parachutes]]
            name = "Main"
            trigger = "300"
            cd_s = 4.0

            [flight]
            rail_length = 3
            terminate_on_apogee = true

            [dispersion]
            num_simulations = 25
            mass_std = 0.02
        "#;

        let config = ScenarioConfig::from_toml(source).unwrap();
        assert_eq!(config.fidelity, Fidelity::Reduced);
        assert_eq!(config.environment.atmosphere, AtmosphereModel::Custom);
        assert_eq!(config.rocket.fins.as_ref().unwrap().n, 4);
        assert_eq!(config.rocket.parachutes.len(), 2);
        assert_eq!(config.dispersion.num_simulations, 25);

        let scenario = config.resolve(&MotorCatalog::builtin().unwrap()).unwrap();
        assert_relative_eq!(scenario.output_rate, 50.0);
        assert_eq!(scenario.rocket.parachutes[0].trigger, Trigger::Apogee);
        assert_eq!(scenario.rocket.parachutes[1].trigger, Trigger::AltitudeBelow(300.0));
        assert!(scenario.flight.terminate_on_apogee);
        assert!(!scenario.rocket.motor.thrust_curve.is_synthesized());
    }

    #[test]
    fn test_unknown_field_value_is_parse_error() {
        let result = ScenarioConfig::from_toml("[environment]\natmosphere = \"plasma\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_catalog_motor_resolution() {
        let catalog = MotorCatalog::builtin().unwrap();
        let config = MotorConfig {
            catalog_id: Some("Aerotech_F50".to_string()),
            ..Default::default()
        };
        let resolved = config.resolve_catalog(&catalog).unwrap();
        assert_relative_eq!(resolved.avg_thrust, 50.0);
        assert_relative_eq!(resolved.propellant_mass, 0.037, epsilon = 1e-12);
        assert_relative_eq!(resolved.dry_mass, 0.048, epsilon = 1e-12);
        assert_eq!(resolved.thrust_curve.unwrap().len(), 7);

        let missing = MotorConfig {
            catalog_id: Some("Nope_Z9".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            missing.resolve_catalog(&catalog),
            Err(ConfigError::UnknownMotor(id)) if id == "Nope_Z9"
        ));
    }

    #[test]
    fn test_bad_sampling_rate_rejected() {
        let config = ScenarioConfig {
            output_sampling_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(&MotorCatalog::builtin().unwrap()),
            Err(ConfigError::NonPositive { field: "output_sampling_rate", .. })
        ));
    }

    #[test]
    fn test_negative_dispersion_std_rejected() {
        let config = DispersionConfig {
            mass_std: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDispersion { field: "mass_std", .. })
        ));
    }
}
