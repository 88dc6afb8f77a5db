//! Read-only motor catalog, loaded once from the embedded table.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const BUILTIN_CATALOG: &str = include_str!("../data/motors.toml");

/// One commercial motor. Masses in grams, dimensions in millimeters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MotorDescriptor {
    pub id: String,
    pub manufacturer: String,
    pub designation: String,
    pub impulse_class: String,
    pub diameter: f64,
    pub length: f64,
    pub total_mass: f64,
    pub propellant_mass: f64,
    pub avg_thrust: f64,
    pub max_thrust: f64,
    pub burn_time: f64,
    pub total_impulse: f64,
    pub isp: f64,
    pub delays: Vec<u32>,
    pub thrust_curve: Vec<[f64; 2]>,
}

impl MotorDescriptor {
    pub fn propellant_mass_kg(&self) -> f64 {
        self.propellant_mass / 1000.0
    }

    /// Casing mass, everything that is not propellant.
    pub fn dry_mass_kg(&self) -> f64 {
        (self.total_mass - self.propellant_mass) / 1000.0
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    motors: Vec<MotorDescriptor>,
}

#[derive(Debug, Clone)]
pub struct MotorCatalog {
    motors: Vec<MotorDescriptor>,
}

impl MotorCatalog {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(source)?;
        debug!("Loaded {} catalog motors", file.motors.len());
        Ok(MotorCatalog {
            motors: file.motors,
        })
    }

    pub fn get(&self, id: &str) -> Option<&MotorDescriptor> {
        self.motors
            .iter()
            .find(|motor| motor.id.eq_ignore_ascii_case(id))
    }

    /// Motors matching both filters; `None` matches everything.
    pub fn filter(
        &self,
        impulse_class: Option<&str>,
        manufacturer: Option<&str>,
    ) -> Vec<&MotorDescriptor> {
        self.motors
            .iter()
            .filter(|motor| {
                impulse_class.map_or(true, |class| motor.impulse_class.eq_ignore_ascii_case(class))
            })
            .filter(|motor| {
                manufacturer.map_or(true, |name| motor.manufacturer.eq_ignore_ascii_case(name))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.motors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motors.is_empty()
    }
}
