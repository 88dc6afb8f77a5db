//! Built-in reference engine: three-degree-of-freedom point mass integrated
//! with fixed-step RK4. Attitude follows the launch rail, then the flight
//! path; there is no rotational dynamics.

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::stability::center_of_pressure;
use crate::atmosphere::isa;
use crate::constants::GRAVITY;
use crate::errors::EngineError;
use crate::model::{EventKind, FlightEvent};
use crate::utils::vector3d::Vector3D;

use super::aerodynamics::Aerodynamics;
use super::engine::{EngineRocket, FlightEngine, FlightGraph, FlightSolution, SolutionSample};
use super::triggers::ParachuteController;

const DEFAULT_ENGINE_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq)]
struct StateRecord {
    time: f64,
    position: Vector3D,
    velocity: Vector3D,
    acceleration: Vector3D,
    attitude: Vector3D,
    mach: f64,
    dynamic_pressure: f64,
    angle_of_attack: f64,
}

impl StateRecord {
    fn lerp(&self, other: &StateRecord, fraction: f64) -> StateRecord {
        let mix = |a: f64, b: f64| a + (b - a) * fraction;
        StateRecord {
            time: mix(self.time, other.time),
            position: self.position.lerp(&other.position, fraction),
            velocity: self.velocity.lerp(&other.velocity, fraction),
            acceleration: self.acceleration.lerp(&other.acceleration, fraction),
            attitude: self.attitude.lerp(&other.attitude, fraction).normalize(),
            mach: mix(self.mach, other.mach),
            dynamic_pressure: mix(self.dynamic_pressure, other.dynamic_pressure),
            angle_of_attack: mix(self.angle_of_attack, other.angle_of_attack),
        }
    }
}

/// Forces acting during one integration step.
struct Dynamics<'a> {
    rocket: &'a EngineRocket,
    aerodynamics: Aerodynamics<'a>,
    elevation: f64,
    wind: Vector3D,
    launch_direction: Vector3D,
    on_rail: bool,
    parachute_area: f64,
}

impl<'a> Dynamics<'a> {
    fn evaluate(&self, time: f64, position: Vector3D, velocity: Vector3D) -> StateRecord {
        let air = isa(self.elevation + position.z);
        let mass = self.rocket.total_mass(time);
        let thrust = self.rocket.motor.thrust(time);

        let attitude = if self.on_rail || velocity.magnitude() < 1e-6 {
            self.launch_direction
        } else {
            velocity.normalize()
        };
        let air_velocity = velocity - self.wind;

        let drag = self
            .aerodynamics
            .calculate_drag(air_velocity, &air, thrust > 0.0, self.parachute_area);
        let gravity = Vector3D::new(0.0, 0.0, -air.gravity * mass);
        let mut acceleration = (attitude * thrust + drag + gravity) / mass;

        if self.on_rail {
            // the rail carries every force component off its axis
            let along = acceleration.dot(&self.launch_direction);
            let moving = velocity.dot(&self.launch_direction) > 0.0;
            acceleration = if along < 0.0 && !moving {
                Vector3D::zeros()
            } else {
                self.launch_direction * along
            };
        }

        StateRecord {
            time,
            position,
            velocity,
            acceleration,
            attitude,
            mach: self.aerodynamics.calculate_mach(air_velocity, &air),
            dynamic_pressure: self.aerodynamics.calculate_dynamic_pressure(air_velocity, &air),
            angle_of_attack: attitude.angle_to(&air_velocity).to_degrees(),
        }
    }

    fn derivatives(
        &self,
        time: f64,
        state: (Vector3D, Vector3D),
    ) -> (Vector3D, Vector3D) {
        let (position, velocity) = state;
        (velocity, self.evaluate(time, position, velocity).acceleration)
    }

    fn rk4_step(&self, time: f64, state: (Vector3D, Vector3D), dt: f64) -> (Vector3D, Vector3D) {
        let k1 = self.derivatives(time, state);
        let k2 = self.derivatives(
            time + dt / 2.0,
            (state.0 + k1.0 * (dt / 2.0), state.1 + k1.1 * (dt / 2.0)),
        );
        let k3 = self.derivatives(
            time + dt / 2.0,
            (state.0 + k2.0 * (dt / 2.0), state.1 + k2.1 * (dt / 2.0)),
        );
        let k4 = self.derivatives(time + dt, (state.0 + k3.0 * dt, state.1 + k3.1 * dt));

        (
            state.0 + (dt / 6.0) * (k1.0 + 2.0 * k2.0 + 2.0 * k3.0 + k4.0),
            state.1 + (dt / 6.0) * (k1.1 + 2.0 * k2.1 + 2.0 * k3.1 + k4.1),
        )
    }
}

#[derive(Debug, Clone)]
pub struct PointMassEngine {
    seed: u64,
}

impl PointMassEngine {
    /// `seed` drives the parachute sensor noise.
    pub fn new(seed: u64) -> Self {
        PointMassEngine { seed }
    }
}

impl Default for PointMassEngine {
    fn default() -> Self {
        PointMassEngine::new(DEFAULT_ENGINE_SEED)
    }
}

impl FlightEngine for PointMassEngine {
    fn name(&self) -> &str {
        "point-mass RK4"
    }

    fn fly(&self, graph: &FlightGraph) -> Result<Box<dyn FlightSolution>, EngineError> {
        let rocket = &graph.rocket;
        let setup = &graph.flight;
        let elevation = graph.environment.elevation;
        let burnout_time = rocket.motor.thrust_curve.burnout_time();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut controllers = rocket
            .parachutes
            .iter()
            .map(ParachuteController::new)
            .collect::<Result<Vec<_>, _>>()?;

        let mut dynamics = Dynamics {
            rocket,
            aerodynamics: Aerodynamics::new(
                &rocket.power_off_drag,
                &rocket.power_on_drag,
                rocket.reference_area(),
            ),
            elevation,
            wind: graph.environment.wind,
            launch_direction: setup.launch_direction,
            on_rail: true,
            parachute_area: 0.0,
        };

        let mut time = 0.0;
        let mut state = (Vector3D::zeros(), Vector3D::zeros());
        let mut records = vec![dynamics.evaluate(time, state.0, state.1)];
        let mut apogee = (0.0, 0.0);
        let mut out_of_rail = (0.0, 0.0);
        let mut impact = None;
        let mut parachute_events = Vec::new();

        while time < setup.max_time {
            let dt = setup.max_time_step.min(setup.max_time - time);
            dynamics.parachute_area = controllers.iter().map(|c| c.drag_area()).sum();
            state = dynamics.rk4_step(time, state, dt);
            time += dt;

            if !state.0.is_finite() || !state.1.is_finite() {
                return Err(EngineError::Diverged { time });
            }

            if dynamics.on_rail {
                let travelled = state.0.dot(&setup.launch_direction);
                if travelled <= 0.0 {
                    state = (Vector3D::zeros(), Vector3D::zeros());
                    if time > burnout_time {
                        let weight = rocket.total_mass(0.0) * GRAVITY;
                        return Err(EngineError::NoLiftoff {
                            thrust_to_weight: rocket.motor.thrust_curve.max_thrust() / weight,
                        });
                    }
                } else if travelled >= setup.rail_length {
                    dynamics.on_rail = false;
                    out_of_rail = (time, state.1.magnitude());
                    debug!("Left the rail at t={:.3}s, {:.2} m/s", time, out_of_rail.1);
                }
            }

            let record = dynamics.evaluate(time, state.0, state.1);
            let previous = records[records.len() - 1];

            if record.position.z > apogee.1 {
                apogee = (time, record.position.z);
            }

            if !dynamics.on_rail && record.position.z < 0.0 {
                let fraction = previous.position.z / (previous.position.z - record.position.z);
                let touchdown = previous.lerp(&record, fraction.clamp(0.0, 1.0));
                records.push(touchdown);
                impact = Some(touchdown);
                break;
            }
            records.push(record);

            for controller in controllers.iter_mut() {
                if let Some(deployed) =
                    controller.update(time, record.position.z, elevation, record.velocity.z, &mut rng)
                {
                    parachute_events.push(
                        FlightEvent::new(
                            EventKind::ParachuteDeployment {
                                parachute: controller.parachute.name.clone(),
                            },
                            deployed,
                        )
                        .with_altitude(record.position.z),
                    );
                }
            }

            if setup.terminate_on_apogee && !dynamics.on_rail && record.velocity.z < 0.0 {
                break;
            }
        }

        let cp = center_of_pressure(rocket.nose.length, Some(&rocket.fins), rocket.radius).cp;
        Ok(Box::new(PointMassSolution {
            records,
            apogee_time: apogee.0,
            apogee: apogee.1,
            out_of_rail_time: out_of_rail.0,
            out_of_rail_velocity: out_of_rail.1,
            impact,
            parachute_events,
            center_of_pressure: cp,
            rocket: rocket.clone(),
        }))
    }
}

pub struct PointMassSolution {
    records: Vec<StateRecord>,
    apogee: f64,
    apogee_time: f64,
    out_of_rail_time: f64,
    out_of_rail_velocity: f64,
    impact: Option<StateRecord>,
    parachute_events: Vec<FlightEvent>,
    center_of_pressure: f64,
    rocket: EngineRocket,
}

impl PointMassSolution {
    fn peak_by<F: Fn(&StateRecord) -> f64>(&self, metric: F) -> (f64, f64) {
        self.records.iter().fold((0.0, 0.0), |best, record| {
            let value = metric(record);
            if value > best.1 {
                (record.time, value)
            } else {
                best
            }
        })
    }
}

impl FlightSolution for PointMassSolution {
    fn t_final(&self) -> f64 {
        self.records.last().map_or(0.0, |record| record.time)
    }

    fn sample(&self, t: f64) -> Result<SolutionSample, EngineError> {
        if !(0.0..=self.t_final()).contains(&t) {
            return Err(EngineError::OutOfDomain(t));
        }
        let upper = self.records.partition_point(|record| record.time <= t);
        let record = match (upper.checked_sub(1), self.records.get(upper)) {
            (Some(i), Some(next)) => {
                let current = &self.records[i];
                let span = next.time - current.time;
                let fraction = if span > 0.0 { (t - current.time) / span } else { 0.0 };
                current.lerp(next, fraction)
            }
            (Some(i), None) => self.records[i],
            (None, _) => return Err(EngineError::OutOfDomain(t)),
        };

        Ok(SolutionSample {
            position: record.position,
            velocity: record.velocity,
            acceleration: Some(record.acceleration),
            attitude_angle: Some(record.attitude.elevation().to_degrees()),
            mach: record.mach,
            dynamic_pressure: record.dynamic_pressure,
            angle_of_attack: record.angle_of_attack,
        })
    }

    fn apogee(&self) -> f64 {
        self.apogee
    }

    fn apogee_time(&self) -> f64 {
        self.apogee_time
    }

    fn max_speed(&self) -> f64 {
        self.peak_by(|record| record.velocity.magnitude()).1
    }

    fn out_of_rail_time(&self) -> f64 {
        self.out_of_rail_time
    }

    fn out_of_rail_velocity(&self) -> f64 {
        self.out_of_rail_velocity
    }

    fn max_speed_time(&self) -> Option<f64> {
        Some(self.peak_by(|record| record.velocity.magnitude()).0)
    }

    fn max_acceleration(&self) -> Option<f64> {
        Some(self.peak_by(|record| record.acceleration.magnitude()).1)
    }

    fn max_mach_number(&self) -> Option<f64> {
        Some(self.peak_by(|record| record.mach).1)
    }

    fn impact_time(&self) -> Option<f64> {
        self.impact.map(|record| record.time)
    }

    fn impact_velocity(&self) -> Option<f64> {
        self.impact.map(|record| record.velocity.z)
    }

    fn impact_position(&self) -> Option<[f64; 2]> {
        self.impact
            .map(|record| [record.position.x, record.position.y])
    }

    fn out_of_rail_static_margin(&self) -> Option<f64> {
        self.static_margin(self.out_of_rail_time)
    }

    fn static_margin(&self, t: f64) -> Option<f64> {
        let cg = self.rocket.center_of_mass_at(t);
        Some((self.center_of_pressure - cg) / (2.0 * self.rocket.radius))
    }

    fn center_of_mass(&self, t: f64) -> Option<f64> {
        Some(self.rocket.center_of_mass_at(t))
    }

    fn center_of_pressure(&self) -> Option<f64> {
        Some(self.center_of_pressure)
    }

    fn parachute_events(&self) -> Vec<FlightEvent> {
        self.parachute_events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvironmentConfig, FlightConfig, MotorConfig, ParachuteConfig, RocketConfig};
    use crate::model::{Environment, FlightParameters, Rocket};
    use approx::assert_relative_eq;

    fn graph(rocket: RocketConfig, flight: FlightConfig, environment: EnvironmentConfig) -> FlightGraph {
        FlightGraph::build(
            &Rocket::try_from(&rocket).unwrap(),
            &Environment::try_from(&environment).unwrap(),
            &FlightParameters::try_from(&flight).unwrap(),
        )
        .unwrap()
    }

    fn default_graph() -> FlightGraph {
        graph(
            RocketConfig::default(),
            FlightConfig::default(),
            EnvironmentConfig::default(),
        )
    }

    #[test]
    fn test_default_flight_reaches_apogee_and_lands() {
        let solution = PointMassEngine::default().fly(&default_graph()).unwrap();

        assert!(solution.apogee() > 50.0, "apogee {}", solution.apogee());
        assert!(solution.apogee_time() > 1.5);
        assert!(solution.out_of_rail_time() > 0.0);
        assert!(solution.out_of_rail_velocity() > 0.0);

        let impact = solution.impact_time().unwrap();
        assert!(impact > solution.apogee_time());
        assert_relative_eq!(solution.t_final(), impact);
        assert!(solution.impact_velocity().unwrap() < 0.0);

        let landing = solution.sample(impact).unwrap();
        assert!(landing.position.z.abs() < 1e-6);
    }

    #[test]
    fn test_sampling_outside_domain_fails() {
        let solution = PointMassEngine::default().fly(&default_graph()).unwrap();
        let beyond = solution.t_final() + 1.0;
        assert_eq!(solution.sample(beyond), Err(EngineError::OutOfDomain(beyond)));
        assert!(solution.sample(-0.5).is_err());
        assert!(solution.sample(0.0).is_ok());
    }

    #[test]
    fn test_terminate_on_apogee() {
        let flight = FlightConfig {
            terminate_on_apogee: true,
            ..Default::default()
        };
        let solution = PointMassEngine::default()
            .fly(&graph(RocketConfig::default(), flight, EnvironmentConfig::default()))
            .unwrap();

        assert!(solution.impact_time().is_none());
        assert!(solution.t_final() - solution.apogee_time() < 0.05);
    }

    #[test]
    fn test_underpowered_rocket_never_lifts_off() {
        let rocket = RocketConfig {
            mass: 20.0,
            ..Default::default()
        };
        let result = PointMassEngine::default().fly(&graph(
            rocket,
            FlightConfig::default(),
            EnvironmentConfig::default(),
        ));

        assert!(matches!(result, Err(EngineError::NoLiftoff { .. })));
    }

    #[test]
    fn test_parachute_slows_descent() {
        let bare = PointMassEngine::default().fly(&default_graph()).unwrap();

        let rocket = RocketConfig {
            parachutes: vec![ParachuteConfig {
                lag: 0.5,
                ..Default::default()
            }],
            ..Default::default()
        };
        let recovered = PointMassEngine::default()
            .fly(&graph(rocket, FlightConfig::default(), EnvironmentConfig::default()))
            .unwrap();

        let events = recovered.parachute_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].time > recovered.apogee_time());
        assert!(recovered.impact_velocity().unwrap().abs() < bare.impact_velocity().unwrap().abs());
        assert!(recovered.t_final() > bare.t_final());
    }

    #[test]
    fn test_wind_drifts_landing() {
        let environment = EnvironmentConfig {
            wind_speed: 5.0,
            wind_direction: 0.0,
            ..Default::default()
        };
        let flight = FlightConfig {
            inclination: 90.0,
            ..Default::default()
        };
        let solution = PointMassEngine::default()
            .fly(&graph(RocketConfig::default(), flight, environment))
            .unwrap();

        let [east, north] = solution.impact_position().unwrap();
        assert!(east > 1.0, "east drift {}", east);
        assert!(north.abs() < 1e-6);
    }

    #[test]
    fn test_static_margin_grows_as_propellant_burns() {
        let rocket = RocketConfig {
            motor: MotorConfig {
                propellant_mass: 0.2,
                ..Default::default()
            },
            ..Default::default()
        };
        let solution = PointMassEngine::default()
            .fly(&graph(rocket, FlightConfig::default(), EnvironmentConfig::default()))
            .unwrap();

        let initial = solution.static_margin(0.0).unwrap();
        let burnout = solution.static_margin(1.5).unwrap();
        assert!(burnout > initial);
        assert_relative_eq!(
            solution.out_of_rail_static_margin().unwrap(),
            solution.static_margin(solution.out_of_rail_time()).unwrap()
        );
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let rocket = RocketConfig {
            parachutes: vec![ParachuteConfig::default()],
            ..Default::default()
        };
        let flight_graph = graph(rocket, FlightConfig::default(), EnvironmentConfig::default());
        let first = PointMassEngine::new(9).fly(&flight_graph).unwrap();
        let second = PointMassEngine::new(9).fly(&flight_graph).unwrap();

        assert_eq!(first.t_final(), second.t_final());
        assert_eq!(first.parachute_events(), second.parachute_events());
    }
}
