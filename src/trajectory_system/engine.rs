//! Contract between the trajectory service and a high-fidelity flight
//! engine, plus the adapter that builds the engine's object graph and
//! normalizes its solution into a [`SimulationResult`].

use log::{debug, info, warn};

use crate::constants::{DEFAULT_NOSE_LENGTH, MOTOR_OFFSET_FACTOR, SENTINEL_STATIC_MARGIN};
use crate::errors::{ConfigError, EngineError, EngineUnavailable};
use crate::model::{
    AtmosphereModel, DragCurve, Environment, EventKind, FinSet, FlightEvent, FlightParameters,
    FlightSummary, GrainGeometry, NoseCone, NoseShape, Parachute, Rocket, SimulationResult,
    StabilityMargins, ThrustCurve, TrajectorySample,
};
use crate::utils::vector3d::Vector3D;

const DEFAULT_POWER_OFF_DRAG: [(f64, f64); 5] =
    [(0.0, 0.5), (0.5, 0.5), (1.0, 0.55), (1.5, 0.6), (2.0, 0.55)];
const DEFAULT_POWER_ON_DRAG: [(f64, f64); 5] =
    [(0.0, 0.45), (0.5, 0.45), (1.0, 0.5), (1.5, 0.55), (2.0, 0.5)];

/// A numerical integrator that can fly a [`FlightGraph`].
pub trait FlightEngine: Send + Sync {
    fn name(&self) -> &str;

    fn fly(&self, graph: &FlightGraph) -> Result<Box<dyn FlightSolution>, EngineError>;
}

/// State of the continuous solution at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionSample {
    pub position: Vector3D,
    pub velocity: Vector3D,
    pub acceleration: Option<Vector3D>,
    pub attitude_angle: Option<f64>, // degrees above horizontal
    pub mach: f64,
    pub dynamic_pressure: f64,
    pub angle_of_attack: f64, // degrees
}

/// Accessors on a finished flight. The provided methods return `None` when
/// an engine does not compute the quantity.
pub trait FlightSolution {
    fn t_final(&self) -> f64;

    /// Continuous state at `t`; fails outside the solution domain.
    fn sample(&self, t: f64) -> Result<SolutionSample, EngineError>;

    fn apogee(&self) -> f64;

    fn apogee_time(&self) -> f64;

    fn max_speed(&self) -> f64;

    fn out_of_rail_time(&self) -> f64;

    fn out_of_rail_velocity(&self) -> f64;

    fn max_speed_time(&self) -> Option<f64> {
        None
    }

    fn max_acceleration(&self) -> Option<f64> {
        None
    }

    fn max_mach_number(&self) -> Option<f64> {
        None
    }

    fn impact_time(&self) -> Option<f64> {
        None
    }

    /// Vertical velocity at impact, negative when descending.
    fn impact_velocity(&self) -> Option<f64> {
        None
    }

    fn impact_position(&self) -> Option<[f64; 2]> {
        None
    }

    fn out_of_rail_static_margin(&self) -> Option<f64> {
        None
    }

    /// Static margin in calibers at `t`.
    fn static_margin(&self, _t: f64) -> Option<f64> {
        None
    }

    /// Center of mass from the nose tip at `t`.
    fn center_of_mass(&self, _t: f64) -> Option<f64> {
        None
    }

    fn center_of_pressure(&self) -> Option<f64> {
        None
    }

    fn parachute_events(&self) -> Vec<FlightEvent> {
        Vec::new()
    }
}

/// Motor as the engine sees it. `position` is the distance of the motor's
/// center of mass aft of the airframe center of mass.
#[derive(Debug, Clone)]
pub struct EngineMotor {
    pub thrust_curve: ThrustCurve,
    pub burn_time: f64,
    pub dry_mass: f64,
    pub propellant_mass: f64,
    pub grain: GrainGeometry,
    pub nozzle_radius: f64,
    pub throat_radius: f64,
    pub position: f64,
}

impl EngineMotor {
    pub fn thrust(&self, time: f64) -> f64 {
        self.thrust_curve.thrust_at(time)
    }

    /// Casing plus remaining propellant; propellant follows delivered impulse.
    pub fn mass(&self, time: f64) -> f64 {
        let total = self.thrust_curve.total_impulse();
        let burnt = if total > 0.0 {
            (self.thrust_curve.impulse_until(time) / total).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.dry_mass + self.propellant_mass * (1.0 - burnt)
    }
}

/// Rocket with every engine default filled in. Axial stations are measured
/// from the nose tip, positive aft.
#[derive(Debug, Clone)]
pub struct EngineRocket {
    pub mass: f64,
    pub radius: f64,
    pub inertia: (f64, f64, f64),
    pub center_of_mass: f64,
    pub power_off_drag: DragCurve,
    pub power_on_drag: DragCurve,
    pub nose: NoseCone,
    pub fins: FinSet,
    pub motor: EngineMotor,
    pub parachutes: Vec<Parachute>,
}

impl EngineRocket {
    pub fn total_mass(&self, time: f64) -> f64 {
        self.mass + self.motor.mass(time)
    }

    pub fn reference_area(&self) -> f64 {
        std::f64::consts::PI * self.radius.powi(2)
    }

    /// Combined center of mass; moves forward as propellant burns.
    pub fn center_of_mass_at(&self, time: f64) -> f64 {
        let motor_mass = self.motor.mass(time);
        let motor_station = self.center_of_mass + self.motor.position;
        (self.mass * self.center_of_mass + motor_mass * motor_station)
            / (self.mass + motor_mass)
    }
}

#[derive(Debug, Clone)]
pub struct EngineEnvironment {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub atmosphere: AtmosphereModel,
    pub wind: Vector3D,
}

#[derive(Debug, Clone)]
pub struct EngineFlightSetup {
    pub rail_length: f64,
    pub launch_direction: Vector3D,
    pub inclination: f64,
    pub heading: f64,
    pub max_time: f64,
    pub max_time_step: f64,
    pub terminate_on_apogee: bool,
}

/// Everything an engine needs for one flight.
#[derive(Debug, Clone)]
pub struct FlightGraph {
    pub rocket: EngineRocket,
    pub environment: EngineEnvironment,
    pub flight: EngineFlightSetup,
}

fn drag_or_default(
    name: &'static str,
    curve: &Option<DragCurve>,
    default: &[(f64, f64)],
) -> Result<DragCurve, ConfigError> {
    match curve {
        Some(curve) => Ok(curve.clone()),
        None => DragCurve::from_points(name, default.to_vec()),
    }
}

impl FlightGraph {
    /// Composes the engine graph, applying default drag curves, nose and fins.
    pub fn build(
        rocket: &Rocket,
        environment: &Environment,
        flight: &FlightParameters,
    ) -> Result<Self, ConfigError> {
        let motor = &rocket.motor;
        let cg = rocket.center_of_mass;

        let nose = rocket.nose.clone().unwrap_or(NoseCone {
            length: DEFAULT_NOSE_LENGTH,
            shape: NoseShape::Ogive,
            base_radius: rocket.radius,
        });
        let fins = rocket.fins.clone().unwrap_or(FinSet {
            count: 3,
            root_chord: 0.08,
            tip_chord: 0.03,
            span: 0.06,
            sweep_length: None,
            sweep_angle: None,
            cant_angle: 0.0,
            position: -cg * 0.9,
        });

        if environment.atmosphere.is_externally_sourced() {
            warn!(
                "{:?} atmosphere is not reachable, using the standard atmosphere with surface wind",
                environment.atmosphere
            );
        }

        Ok(FlightGraph {
            rocket: EngineRocket {
                mass: rocket.mass,
                radius: rocket.radius,
                inertia: (rocket.inertia_i, rocket.inertia_i, rocket.inertia_z),
                center_of_mass: cg,
                power_off_drag: drag_or_default(
                    "power_off_drag",
                    &rocket.power_off_drag,
                    &DEFAULT_POWER_OFF_DRAG,
                )?,
                power_on_drag: drag_or_default(
                    "power_on_drag",
                    &rocket.power_on_drag,
                    &DEFAULT_POWER_ON_DRAG,
                )?,
                nose,
                fins,
                motor: EngineMotor {
                    thrust_curve: motor.thrust_curve.clone(),
                    burn_time: motor.burn_time,
                    dry_mass: motor.dry_mass,
                    propellant_mass: motor.propellant_mass,
                    grain: motor.grain.clone(),
                    nozzle_radius: motor.nozzle_radius,
                    throat_radius: motor.throat_radius,
                    position: cg * MOTOR_OFFSET_FACTOR,
                },
                parachutes: rocket.parachutes.clone(),
            },
            environment: EngineEnvironment {
                latitude: environment.latitude,
                longitude: environment.longitude,
                elevation: environment.elevation,
                atmosphere: environment.atmosphere,
                wind: environment.wind_vector(),
            },
            flight: EngineFlightSetup {
                rail_length: flight.rail_length,
                launch_direction: flight.launch_direction(),
                inclination: flight.inclination,
                heading: flight.heading,
                max_time: flight.max_time,
                max_time_step: flight.max_time_step,
                terminate_on_apogee: flight.terminate_on_apogee,
            },
        })
    }
}

/// Resamples the continuous solution every `1 / output_rate` seconds on
/// `[0, t_final)`, stopping quietly at the first point outside the domain.
fn resample(solution: &dyn FlightSolution, output_rate: f64) -> Vec<TrajectorySample> {
    let dt = 1.0 / output_rate;
    let t_final = solution.t_final();
    let mut trajectory = Vec::new();

    let mut i = 0_u64;
    loop {
        let time = i as f64 * dt;
        if !(time < t_final) {
            break;
        }
        match solution.sample(time) {
            Ok(state) => trajectory.push(TrajectorySample {
                time,
                position: state.position,
                velocity: state.velocity,
                acceleration: state.acceleration.unwrap_or_default(),
                pitch: state.attitude_angle.unwrap_or(0.0),
                yaw: 0.0,
                roll: 0.0,
                mach: state.mach,
                dynamic_pressure: state.dynamic_pressure,
                angle_of_attack: state.angle_of_attack,
            }),
            Err(e) => {
                debug!("Resampling stopped at t={:.3}s: {}", time, e);
                break;
            }
        }
        i += 1;
    }

    trajectory
}

fn collect_result(
    solution: &dyn FlightSolution,
    graph: &FlightGraph,
    output_rate: f64,
) -> SimulationResult {
    let burn_time = graph.rocket.motor.burn_time;
    let trajectory = resample(solution, output_rate);

    let mut events = vec![
        FlightEvent::new(EventKind::Liftoff, 0.0).with_altitude(0.0),
        FlightEvent::new(EventKind::RailDeparture, solution.out_of_rail_time())
            .with_velocity(solution.out_of_rail_velocity()),
        FlightEvent::new(EventKind::Burnout, burn_time),
        FlightEvent::new(EventKind::Apogee, solution.apogee_time()).with_altitude(solution.apogee()),
    ];
    if let Some(impact_time) = solution.impact_time() {
        events.push(
            FlightEvent::new(EventKind::Landing, impact_time)
                .with_velocity(solution.impact_velocity().unwrap_or(0.0)),
        );
    }
    events.extend(solution.parachute_events());
    // stable, so liftoff stays ahead of anything else at t=0
    events.sort_by(|a, b| a.time.total_cmp(&b.time));

    let (initial, burnout) = match (solution.static_margin(0.0), solution.static_margin(burn_time)) {
        (Some(initial), Some(burnout)) => (initial, burnout),
        _ => (SENTINEL_STATIC_MARGIN, SENTINEL_STATIC_MARGIN),
    };

    SimulationResult {
        success: true,
        message: "Simulation completed successfully".to_string(),
        summary: FlightSummary {
            apogee: solution.apogee(),
            apogee_time: solution.apogee_time(),
            max_velocity: solution.max_speed(),
            max_velocity_time: solution.max_speed_time().unwrap_or(0.0),
            max_acceleration: solution.max_acceleration().unwrap_or(0.0),
            max_mach: solution.max_mach_number().unwrap_or(0.0),
            flight_time: solution.t_final(),
            landing_velocity: solution.impact_velocity().unwrap_or(0.0).abs(),
            landing_position: solution.impact_position().unwrap_or([0.0, 0.0]),
            out_of_rail_velocity: solution.out_of_rail_velocity(),
            out_of_rail_stability: solution.out_of_rail_static_margin().unwrap_or(initial),
        },
        trajectory,
        events,
        stability: StabilityMargins {
            initial,
            burnout,
            cp_position: solution.center_of_pressure().unwrap_or(0.0),
            cg_position: solution.center_of_mass(0.0).unwrap_or(0.0),
        },
    }
}

/// Flies the rocket on `engine`. Engine failures come back as a failed
/// result, never as an error.
pub fn run_high_fidelity(
    engine: &dyn FlightEngine,
    rocket: &Rocket,
    environment: &Environment,
    flight: &FlightParameters,
    output_rate: f64,
) -> SimulationResult {
    let graph = match FlightGraph::build(rocket, environment, flight) {
        Ok(graph) => graph,
        Err(e) => {
            warn!("{} could not build the flight: {}", engine.name(), e);
            return SimulationResult::failure(format!("Simulation failed: {}", e));
        }
    };

    match engine.fly(&graph) {
        Ok(solution) => {
            let result = collect_result(solution.as_ref(), &graph, output_rate);
            info!(
                "{}: apogee {:.1} m at {:.2}s, {} samples",
                engine.name(),
                result.summary.apogee,
                result.summary.apogee_time,
                result.trajectory.len()
            );
            result
        }
        Err(e) => {
            warn!("{} failed: {}", engine.name(), e);
            SimulationResult::failure(format!("Simulation failed: {}", e))
        }
    }
}

/// Looks for a compiled-in high-fidelity engine.
#[cfg(feature = "point-mass-engine")]
pub fn detect_engine() -> Result<Box<dyn FlightEngine>, EngineUnavailable> {
    Ok(Box::new(super::point_mass::PointMassEngine::default()))
}

#[cfg(not(feature = "point-mass-engine"))]
pub fn detect_engine() -> Result<Box<dyn FlightEngine>, EngineUnavailable> {
    Err(EngineUnavailable)
}
