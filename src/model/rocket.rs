use crate::config::RocketConfig;
use crate::errors::ConfigError;
use crate::utils::interp::{interp, InterpMode};

use super::{require_positive, FinSet, Motor, NoseCone, Parachute};

/// Drag coefficient against Mach number.
#[derive(Debug, Clone, PartialEq)]
pub struct DragCurve {
    points: Vec<(f64, f64)>,
}

impl DragCurve {
    pub fn from_points(name: &'static str, points: Vec<(f64, f64)>) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDragCurve { name, reason };

        if points.is_empty() {
            return Err(invalid("no points".to_string()));
        }
        for &(mach, cd) in &points {
            if !mach.is_finite() || !cd.is_finite() || mach < 0.0 || cd < 0.0 {
                return Err(invalid(format!("point ({mach}, {cd}) is out of range")));
            }
        }
        if points.windows(2).any(|pair| pair[1].0 < pair[0].0) {
            return Err(invalid("Mach numbers must not decrease".to_string()));
        }

        Ok(DragCurve { points })
    }

    /// Drag coefficient at `mach`, holding the end values outside the table.
    pub fn cd_at(&self, mach: f64) -> f64 {
        interp(&self.points, mach, InterpMode::FirstLast)
    }
}

fn drag_curve(
    name: &'static str,
    points: &Option<Vec<[f64; 2]>>,
) -> Result<Option<DragCurve>, ConfigError> {
    points
        .as_ref()
        .map(|points| {
            DragCurve::from_points(name, points.iter().map(|&[mach, cd]| (mach, cd)).collect())
        })
        .transpose()
}

/// Airframe plus motor. `mass` excludes the motor; `center_of_mass` is
/// measured from the nose tip.
#[derive(Debug, Clone, PartialEq)]
pub struct Rocket {
    pub mass: f64,
    pub radius: f64,
    pub inertia_i: f64,
    pub inertia_z: f64,
    pub center_of_mass: f64,
    pub power_off_drag: Option<DragCurve>,
    pub power_on_drag: Option<DragCurve>,
    pub nose: Option<NoseCone>,
    pub fins: Option<FinSet>,
    pub motor: Motor,
    pub parachutes: Vec<Parachute>,
}

impl Rocket {
    /// Airframe, propellant and motor casing.
    pub fn liftoff_mass(&self) -> f64 {
        self.mass + self.motor.total_mass()
    }

    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    /// Copy with a different airframe mass.
    pub fn with_mass(&self, mass: f64) -> Result<Self, ConfigError> {
        Ok(Rocket {
            mass: require_positive("mass", mass)?,
            ..self.clone()
        })
    }

    /// Copy whose motor thrust is scaled by `factor`.
    pub fn with_thrust_scale(&self, factor: f64) -> Result<Self, ConfigError> {
        Ok(Rocket {
            motor: self.motor.with_thrust_scale(factor)?,
            ..self.clone()
        })
    }
}

impl TryFrom<&RocketConfig> for Rocket {
    type Error = ConfigError;

    fn try_from(config: &RocketConfig) -> Result<Self, Self::Error> {
        let radius = require_positive("radius", config.radius)?;

        Ok(Rocket {
            mass: require_positive("mass", config.mass)?,
            radius,
            inertia_i: require_positive("inertia_i", config.inertia_i)?,
            inertia_z: require_positive("inertia_z", config.inertia_z)?,
            center_of_mass: require_positive("center_of_mass", config.center_of_mass)?,
            power_off_drag: drag_curve("power_off_drag", &config.power_off_drag)?,
            power_on_drag: drag_curve("power_on_drag", &config.power_on_drag)?,
            nose: config
                .nose
                .as_ref()
                .map(|nose| NoseCone::from_config(nose, radius))
                .transpose()?,
            fins: config.fins.as_ref().map(FinSet::try_from).transpose()?,
            motor: Motor::try_from(&config.motor)?,
            parachutes: config
                .parachutes
                .iter()
                .map(Parachute::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}
