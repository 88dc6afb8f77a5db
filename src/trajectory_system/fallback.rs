//! Reduced-order vertical flight: constant-acceleration burn, drag-free
//! ballistic coast. Good for direction and order of magnitude only.

use log::debug;

use crate::analysis::stability::estimate_stability;
use crate::constants::{
    AIR_DENSITY_SEA_LEVEL, FALLBACK_HORIZON_FACTOR, GRAVITY, NOMINAL_BURNOUT_MARGIN,
    SEA_LEVEL_SOUND_SPEED, SENTINEL_STATIC_MARGIN,
};
use crate::model::{
    Environment, EventKind, FlightEvent, FlightParameters, FlightSummary, Rocket,
    SimulationResult, StabilityMargins, TrajectorySample,
};
use crate::utils::vector3d::Vector3D;

pub const FALLBACK_MESSAGE: &str =
    "Reduced-order estimate (no high-fidelity engine available); vertical flight, no drag";

/// Closed-form burn and coast milestones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallisticEstimate {
    pub liftoff_mass: f64,
    pub burn_acceleration: f64,
    pub burnout_velocity: f64,
    pub burnout_altitude: f64,
    pub coast_time: f64,
    pub apogee: f64,
    pub apogee_time: f64,
}

impl BallisticEstimate {
    pub fn new(rocket: &Rocket) -> Self {
        let motor = &rocket.motor;
        let burn_time = motor.burn_time;
        let liftoff_mass = rocket.liftoff_mass();
        let mean_mass = liftoff_mass - motor.propellant_mass / 2.0;

        let burn_acceleration = motor.average_thrust / mean_mass - GRAVITY;
        let burnout_velocity = burn_acceleration * burn_time;
        let burnout_altitude = 0.5 * burn_acceleration * burn_time.powi(2);

        let coast_time = burnout_velocity / GRAVITY;
        let coast_altitude = burnout_velocity * coast_time - 0.5 * GRAVITY * coast_time.powi(2);

        BallisticEstimate {
            liftoff_mass,
            burn_acceleration,
            burnout_velocity,
            burnout_altitude,
            coast_time,
            apogee: burnout_altitude + coast_altitude,
            apogee_time: burn_time + coast_time,
        }
    }

    /// Net thrust cannot beat gravity.
    pub fn stays_on_pad(&self) -> bool {
        self.burn_acceleration <= 0.0
    }
}

fn vertical_sample(time: f64, altitude: f64, velocity: f64, acceleration: f64) -> TrajectorySample {
    TrajectorySample {
        time,
        position: Vector3D::new(0.0, 0.0, altitude),
        velocity: Vector3D::new(0.0, 0.0, velocity),
        acceleration: Vector3D::new(0.0, 0.0, acceleration),
        pitch: 90.0,
        yaw: 0.0,
        roll: 0.0,
        mach: velocity / SEA_LEVEL_SOUND_SPEED,
        dynamic_pressure: 0.5 * AIR_DENSITY_SEA_LEVEL * velocity.powi(2),
        angle_of_attack: 0.0,
    }
}

/// Explicit-Euler vertical trajectory on a `1 / output_rate` grid, with mass
/// falling linearly during the burn. Stops at the first negative altitude
/// after burnout or at the horizon cap.
fn integrate(rocket: &Rocket, estimate: &BallisticEstimate, output_rate: f64) -> (Vec<TrajectorySample>, f64) {
    let motor = &rocket.motor;
    let burn_time = motor.burn_time;
    let dt = 1.0 / output_rate;
    let horizon = estimate.apogee_time * FALLBACK_HORIZON_FACTOR;

    let mut trajectory: Vec<TrajectorySample> = Vec::new();
    let mut i = 0_u64;
    let mut time = 0.0;
    while time < horizon {
        let acceleration = if time < burn_time {
            let mass = estimate.liftoff_mass - motor.propellant_mass * time / burn_time;
            motor.average_thrust / mass - GRAVITY
        } else {
            -GRAVITY
        };

        let (velocity, altitude) = match trajectory.last() {
            None => (0.0, 0.0),
            Some(previous) => {
                let velocity = previous.velocity.z + acceleration * dt;
                (velocity, previous.position.z + velocity * dt)
            }
        };

        if altitude < 0.0 && time > burn_time {
            break;
        }
        trajectory.push(vertical_sample(time, altitude.max(0.0), velocity, acceleration));

        i += 1;
        time = i as f64 * dt;
    }

    (trajectory, time)
}

/// Reduced-order estimate used when no engine is available. Always succeeds.
pub fn run_fallback(
    rocket: &Rocket,
    _environment: &Environment,
    _flight: &FlightParameters,
    output_rate: f64,
) -> SimulationResult {
    let burn_time = rocket.motor.burn_time;
    let estimate = BallisticEstimate::new(rocket);
    let stability = estimate_stability(rocket);
    let margins = StabilityMargins {
        initial: SENTINEL_STATIC_MARGIN,
        burnout: NOMINAL_BURNOUT_MARGIN,
        cp_position: stability.cp,
        cg_position: stability.cg,
    };

    if estimate.stays_on_pad() {
        debug!(
            "Net burn acceleration {:.2} m/s², vehicle stays on the pad",
            estimate.burn_acceleration
        );
        return SimulationResult {
            success: true,
            message: FALLBACK_MESSAGE.to_string(),
            summary: FlightSummary {
                out_of_rail_stability: SENTINEL_STATIC_MARGIN,
                ..Default::default()
            },
            trajectory: vec![vertical_sample(0.0, 0.0, 0.0, 0.0)],
            events: vec![
                FlightEvent::new(EventKind::Liftoff, 0.0).with_altitude(0.0),
                FlightEvent::new(EventKind::Burnout, burn_time),
            ],
            stability: margins,
        };
    }

    let (trajectory, end_time) = integrate(rocket, &estimate, output_rate);
    let final_velocity = trajectory.last().map_or(0.0, |sample| sample.velocity.z);
    debug!(
        "Reduced-order apogee {:.1} m at {:.2}s, {} samples",
        estimate.apogee,
        estimate.apogee_time,
        trajectory.len()
    );

    SimulationResult {
        success: true,
        message: FALLBACK_MESSAGE.to_string(),
        summary: FlightSummary {
            apogee: estimate.apogee,
            apogee_time: estimate.apogee_time,
            max_velocity: estimate.burnout_velocity,
            max_velocity_time: burn_time,
            max_acceleration: estimate.burn_acceleration,
            max_mach: estimate.burnout_velocity / SEA_LEVEL_SOUND_SPEED,
            flight_time: end_time,
            landing_velocity: final_velocity.abs(),
            landing_position: [0.0, 0.0],
            out_of_rail_velocity: 0.0,
            out_of_rail_stability: SENTINEL_STATIC_MARGIN,
        },
        trajectory,
        events: vec![
            FlightEvent::new(EventKind::Liftoff, 0.0).with_altitude(0.0),
            FlightEvent::new(EventKind::Burnout, burn_time),
            FlightEvent::new(EventKind::Apogee, estimate.apogee_time).with_altitude(estimate.apogee),
            FlightEvent::new(EventKind::Landing, end_time).with_velocity(final_velocity),
        ],
        stability: margins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvironmentConfig, FlightConfig, MotorConfig, RocketConfig};
    use approx::assert_relative_eq;

    fn run(rocket: RocketConfig, rate: f64) -> SimulationResult {
        run_fallback(
            &Rocket::try_from(&rocket).unwrap(),
            &Environment::try_from(&EnvironmentConfig::default()).unwrap(),
            &FlightParameters::try_from(&FlightConfig::default()).unwrap(),
            rate,
        )
    }

    #[test]
    fn test_closed_form_milestones() {
        let rocket = Rocket::try_from(&RocketConfig::default()).unwrap();
        let estimate = BallisticEstimate::new(&rocket);

        // 50 / (0.58 - 0.025) - 9.81
        let a = 50.0 / 0.555 - 9.81;
        assert_relative_eq!(estimate.burn_acceleration, a, epsilon = 1e-9);
        assert_relative_eq!(estimate.burnout_velocity, a * 1.5, epsilon = 1e-9);
        let v = a * 1.5;
        assert_relative_eq!(
            estimate.apogee,
            0.5 * a * 2.25 + v * v / (2.0 * 9.81),
            epsilon = 1e-9
        );
        assert_relative_eq!(estimate.apogee_time, 1.5 + v / 9.81, epsilon = 1e-9);
    }

    #[test]
    fn test_default_flight_profile() {
        let result = run(RocketConfig::default(), 100.0);

        assert!(result.success);
        assert_eq!(result.message, FALLBACK_MESSAGE);
        assert!(result.summary.apogee > 0.0);
        assert_eq!(result.stability.initial, 2.0);
        assert_eq!(result.stability.burnout, 2.5);
        assert_eq!(result.summary.landing_position, [0.0, 0.0]);

        let first = &result.trajectory[0];
        assert_eq!(first.time, 0.0);
        assert_eq!(first.position.z, 0.0);
        assert_eq!(first.velocity.z, 0.0);
        assert!(result.trajectory.iter().all(|sample| sample.position.z >= 0.0));
        assert!(result
            .trajectory
            .windows(2)
            .all(|pair| pair[1].time > pair[0].time));

        let burnout = result.event(&EventKind::Burnout).unwrap();
        let apogee = result.event(&EventKind::Apogee).unwrap();
        let landing = result.event(&EventKind::Landing).unwrap();
        assert_eq!(burnout.time, 1.5);
        assert!(landing.time > apogee.time);
        assert!(landing.velocity.unwrap() < 0.0);
        assert_relative_eq!(result.summary.landing_velocity, landing.velocity.unwrap().abs());
    }

    #[test]
    fn test_mach_uses_sea_level_sound_speed() {
        let result = run(RocketConfig::default(), 50.0);
        for sample in &result.trajectory {
            assert_relative_eq!(sample.mach, sample.velocity.z / 340.0);
            assert_eq!(sample.pitch, 90.0);
            assert_eq!(sample.angle_of_attack, 0.0);
        }
    }

    #[test]
    fn test_runs_are_bit_identical() {
        let first = run(RocketConfig::default(), 100.0);
        let second = run(RocketConfig::default(), 100.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_heavy_rocket_stays_on_pad() {
        let rocket = RocketConfig {
            mass: 10.0,
            motor: MotorConfig::default(),
            ..Default::default()
        };
        let result = run(rocket, 100.0);

        assert!(result.success);
        assert_eq!(result.summary.apogee, 0.0);
        assert_eq!(result.trajectory.len(), 1);
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].kind, EventKind::Liftoff);
        assert_eq!(result.events[1].kind, EventKind::Burnout);
    }
}
