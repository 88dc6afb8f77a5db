use serde::{Deserialize, Serialize};

use crate::config::MotorConfig;
use crate::errors::ConfigError;
use crate::utils::interp::{interp, InterpMode};

use super::{require_non_negative, require_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorKind {
    #[default]
    Solid,
    Hybrid,
    Liquid,
}

/// Thrust against time since ignition, as `(time s, thrust N)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrustCurve {
    points: Vec<(f64, f64)>,
    synthesized: bool,
}

impl ThrustCurve {
    /// Validates a measured curve: at least two points, finite values,
    /// non-negative times and thrust, time non-decreasing.
    pub fn from_points(points: Vec<(f64, f64)>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::InvalidThrustCurve(format!(
                "needs at least 2 points, got {}",
                points.len()
            )));
        }
        for (i, &(time, thrust)) in points.iter().enumerate() {
            if !time.is_finite() || !thrust.is_finite() {
                return Err(ConfigError::InvalidThrustCurve(format!(
                    "point {i} is not finite"
                )));
            }
            if time < 0.0 || thrust < 0.0 {
                return Err(ConfigError::InvalidThrustCurve(format!(
                    "point {i} ({time}, {thrust}) is negative"
                )));
            }
        }
        if let Some(i) = points.windows(2).position(|pair| pair[1].0 < pair[0].0) {
            return Err(ConfigError::InvalidThrustCurve(format!(
                "time decreases after point {i}"
            )));
        }
        if points[points.len() - 1].0 <= points[0].0 {
            return Err(ConfigError::InvalidThrustCurve(
                "curve spans zero time".to_string(),
            ));
        }

        Ok(ThrustCurve {
            points,
            synthesized: false,
        })
    }

    /// Approximate curve built from average thrust and burn time: a fast
    /// rise to 1.5x average, decaying through 1.2x, 1.0x and 0.6x to zero.
    /// This is a shape assumption, not measured data.
    pub fn synthesize(average_thrust: f64, burn_time: f64) -> Result<Self, ConfigError> {
        require_positive("avg_thrust", average_thrust)?;
        require_positive("burn_time", burn_time)?;

        let rise = 0.02_f64.min(0.05 * burn_time);
        let points = vec![
            (0.0, 0.0),
            (rise, average_thrust * 1.5),
            (burn_time * 0.1, average_thrust * 1.2),
            (burn_time * 0.5, average_thrust),
            (burn_time * 0.9, average_thrust * 0.6),
            (burn_time, 0.0),
        ];

        Ok(ThrustCurve {
            points,
            synthesized: true,
        })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// Thrust at `time`; zero before ignition and after the last point.
    pub fn thrust_at(&self, time: f64) -> f64 {
        interp(&self.points, time, InterpMode::Constant(0.0))
    }

    pub fn burnout_time(&self) -> f64 {
        self.points[self.points.len() - 1].0
    }

    pub fn max_thrust(&self) -> f64 {
        self.points.iter().map(|&(_, thrust)| thrust).fold(0.0, f64::max)
    }

    /// Impulse delivered between ignition and `time` (trapezoidal, exact for
    /// the piecewise-linear curve).
    pub fn impulse_until(&self, time: f64) -> f64 {
        let mut impulse = 0.0;
        for pair in self.points.windows(2) {
            let (t0, f0) = pair[0];
            let (t1, f1) = pair[1];
            if time <= t0 {
                break;
            }
            if time >= t1 {
                impulse += 0.5 * (f0 + f1) * (t1 - t0);
            } else {
                let f_end = f0 + (f1 - f0) * (time - t0) / (t1 - t0);
                impulse += 0.5 * (f0 + f_end) * (time - t0);
            }
        }
        impulse
    }

    pub fn total_impulse(&self) -> f64 {
        self.impulse_until(self.burnout_time())
    }

    /// Same shape with every thrust value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        ThrustCurve {
            points: self
                .points
                .iter()
                .map(|&(time, thrust)| (time, (thrust * factor).max(0.0)))
                .collect(),
            synthesized: self.synthesized,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrainGeometry {
    pub outer_radius: f64,
    pub initial_inner_radius: f64,
    pub initial_height: f64,
    pub count: u32,
    pub separation: f64,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    pub kind: MotorKind,
    pub burn_time: f64,
    pub total_impulse: f64,
    pub average_thrust: f64,
    pub thrust_curve: ThrustCurve,
    pub propellant_mass: f64,
    pub dry_mass: f64,
    pub grain: GrainGeometry,
    pub nozzle_radius: f64,
    pub throat_radius: f64,
}

impl Motor {
    pub fn total_mass(&self) -> f64 {
        self.propellant_mass + self.dry_mass
    }

    /// Propellant left at `time`, depleting in proportion to delivered impulse.
    pub fn propellant_mass_at(&self, time: f64) -> f64 {
        let total = self.thrust_curve.total_impulse();
        if total <= 0.0 {
            return self.propellant_mass;
        }
        let burnt_fraction = (self.thrust_curve.impulse_until(time) / total).clamp(0.0, 1.0);
        self.propellant_mass * (1.0 - burnt_fraction)
    }

    /// Copy with thrust scaled by `factor`; impulse scales with it.
    pub fn with_thrust_scale(&self, factor: f64) -> Result<Self, ConfigError> {
        require_positive("thrust scale", factor)?;
        Ok(Motor {
            total_impulse: self.total_impulse * factor,
            average_thrust: self.average_thrust * factor,
            thrust_curve: self.thrust_curve.scaled(factor),
            ..self.clone()
        })
    }
}

impl TryFrom<&MotorConfig> for Motor {
    type Error = ConfigError;

    fn try_from(config: &MotorConfig) -> Result<Self, Self::Error> {
        let burn_time = require_positive("burn_time", config.burn_time)?;
        let average_thrust = require_positive("avg_thrust", config.avg_thrust)?;
        let total_impulse = require_positive("total_impulse", config.total_impulse)?;
        let propellant_mass = require_non_negative("propellant_mass", config.propellant_mass)?;
        let dry_mass = require_non_negative("dry_mass", config.dry_mass)?;

        if config.grain_number < 1 {
            return Err(ConfigError::NonPositive {
                field: "grain_number",
                value: config.grain_number as f64,
            });
        }
        let grain = GrainGeometry {
            outer_radius: require_positive("grain_outer_radius", config.grain_outer_radius)?,
            initial_inner_radius: require_positive(
                "grain_initial_inner_radius",
                config.grain_initial_inner_radius,
            )?,
            initial_height: require_positive("grain_initial_height", config.grain_initial_height)?,
            count: config.grain_number,
            separation: require_positive("grain_separation", config.grain_separation)?,
            density: require_positive("grain_density", config.grain_density)?,
        };
        require_positive(
            "grain wall thickness",
            grain.outer_radius - grain.initial_inner_radius,
        )?;

        let thrust_curve = match &config.thrust_curve {
            Some(points) => ThrustCurve::from_points(
                points.iter().map(|&[time, thrust]| (time, thrust)).collect(),
            )?,
            None => ThrustCurve::synthesize(average_thrust, burn_time)?,
        };

        Ok(Motor {
            kind: config.kind,
            burn_time,
            total_impulse,
            average_thrust,
            thrust_curve,
            propellant_mass,
            dry_mass,
            grain,
            nozzle_radius: require_positive("nozzle_radius", config.nozzle_radius)?,
            throat_radius: require_positive("throat_radius", config.throat_radius)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_synthesized_curve_shape() {
        for burn_time in [0.05, 0.15, 0.2, 1.5, 3.9, 12.0] {
            let curve = ThrustCurve::synthesize(50.0, burn_time).unwrap();
            let points = curve.points();
            assert!(curve.is_synthesized());
            assert_eq!(points.first().unwrap().1, 0.0);
            assert_eq!(points.last().unwrap().1, 0.0);
            assert_relative_eq!(curve.burnout_time(), burn_time);
            assert!(
                points.windows(2).all(|pair| pair[1].0 > pair[0].0),
                "times must increase for burn_time {}",
                burn_time
            );
        }
    }

    #[test]
    fn test_synthesized_curve_peak() {
        let curve = ThrustCurve::synthesize(50.0, 1.5).unwrap();
        assert_relative_eq!(curve.max_thrust(), 75.0);
        assert_relative_eq!(curve.thrust_at(0.75), 50.0);
        assert_eq!(curve.thrust_at(-0.1), 0.0);
        assert_eq!(curve.thrust_at(2.0), 0.0);
    }

    #[test]
    fn test_malformed_curves_rejected() {
        assert!(ThrustCurve::from_points(vec![(0.0, 0.0)]).is_err());
        assert!(ThrustCurve::from_points(vec![(0.0, 0.0), (1.0, 5.0), (0.5, 0.0)]).is_err());
        assert!(ThrustCurve::from_points(vec![(0.0, 0.0), (1.0, -5.0)]).is_err());
        assert!(ThrustCurve::from_points(vec![(0.0, 0.0), (f64::NAN, 5.0)]).is_err());
        assert!(ThrustCurve::from_points(vec![(1.0, 0.0), (1.0, 5.0)]).is_err());
    }

    #[test]
    fn test_impulse_integration() {
        // Triangle: 0 -> 100 N at 1 s -> 0 at 2 s, 100 Ns total
        let curve =
            ThrustCurve::from_points(vec![(0.0, 0.0), (1.0, 100.0), (2.0, 0.0)]).unwrap();
        assert_abs_diff_eq!(curve.total_impulse(), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.impulse_until(1.0), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.impulse_until(0.5), 12.5, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.impulse_until(1.5), 87.5, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.impulse_until(5.0), 100.0, epsilon = 1e-9);
        assert_eq!(curve.impulse_until(-1.0), 0.0);
    }

    #[test]
    fn test_propellant_depletes_with_impulse() {
        let motor = Motor::try_from(&MotorConfig::default()).unwrap();
        assert_relative_eq!(motor.propellant_mass_at(0.0), 0.05);
        assert_abs_diff_eq!(motor.propellant_mass_at(motor.burn_time), 0.0, epsilon = 1e-12);
        let mid = motor.propellant_mass_at(0.75);
        assert!(mid > 0.0 && mid < 0.05);
    }

    #[test]
    fn test_motor_validation() {
        let zero_burn = MotorConfig {
            burn_time: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Motor::try_from(&zero_burn),
            Err(ConfigError::NonPositive { field: "burn_time", .. })
        ));

        let negative_mass = MotorConfig {
            propellant_mass: -0.01,
            ..Default::default()
        };
        assert!(matches!(
            Motor::try_from(&negative_mass),
            Err(ConfigError::Negative { field: "propellant_mass", .. })
        ));

        let inverted_grain = MotorConfig {
            grain_initial_inner_radius: 0.03,
            ..Default::default()
        };
        assert!(Motor::try_from(&inverted_grain).is_err());

        let bad_curve = MotorConfig {
            thrust_curve: Some(vec![[0.0, 0.0]]),
            ..Default::default()
        };
        assert!(matches!(
            Motor::try_from(&bad_curve),
            Err(ConfigError::InvalidThrustCurve(_))
        ));
    }

    #[test]
    fn test_thrust_scale() {
        let motor = Motor::try_from(&MotorConfig::default()).unwrap();
        let hotter = motor.with_thrust_scale(1.1).unwrap();
        assert_relative_eq!(hotter.average_thrust, 55.0);
        assert_relative_eq!(
            hotter.thrust_curve.total_impulse(),
            motor.thrust_curve.total_impulse() * 1.1,
            epsilon = 1e-9
        );
        assert!(motor.with_thrust_scale(0.0).is_err());
    }
}
