use serde::Serialize;

use crate::utils::vector3d::Vector3D;

/// One point of the resampled trajectory. Angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub time: f64,
    pub position: Vector3D,
    pub velocity: Vector3D,
    pub acceleration: Vector3D,
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
    pub mach: f64,
    pub dynamic_pressure: f64,
    pub angle_of_attack: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum EventKind {
    Liftoff,
    RailDeparture,
    Burnout,
    Apogee,
    Landing,
    ParachuteDeployment { parachute: String },
}

impl EventKind {
    pub fn label(&self) -> String {
        match self {
            EventKind::Liftoff => "liftoff".to_string(),
            EventKind::RailDeparture => "rail_departure".to_string(),
            EventKind::Burnout => "burnout".to_string(),
            EventKind::Apogee => "apogee".to_string(),
            EventKind::Landing => "landing".to_string(),
            EventKind::ParachuteDeployment { parachute } => {
                format!("parachute_deployment ({})", parachute)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
}

impl FlightEvent {
    pub fn new(kind: EventKind, time: f64) -> Self {
        FlightEvent {
            kind,
            time,
            altitude: None,
            velocity: None,
        }
    }

    pub fn with_altitude(self, altitude: f64) -> Self {
        FlightEvent {
            altitude: Some(altitude),
            ..self
        }
    }

    pub fn with_velocity(self, velocity: f64) -> Self {
        FlightEvent {
            velocity: Some(velocity),
            ..self
        }
    }
}

/// Scalar flight statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlightSummary {
    pub apogee: f64,
    pub apogee_time: f64,
    pub max_velocity: f64,
    pub max_velocity_time: f64,
    pub max_acceleration: f64,
    pub max_mach: f64,
    pub flight_time: f64,
    pub landing_velocity: f64,
    pub landing_position: [f64; 2],
    pub out_of_rail_velocity: f64,
    pub out_of_rail_stability: f64,
}

/// Static margins in calibers; positions in meters from the nose tip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StabilityMargins {
    pub initial: f64,
    pub burnout: f64,
    pub cp_position: f64,
    pub cg_position: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationResult {
    pub success: bool,
    pub message: String,
    pub summary: FlightSummary,
    pub trajectory: Vec<TrajectorySample>,
    pub events: Vec<FlightEvent>,
    pub stability: StabilityMargins,
}

impl SimulationResult {
    /// Failed run: every numeric field zeroed, no trajectory or events.
    pub fn failure(message: impl Into<String>) -> Self {
        SimulationResult {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn event(&self, kind: &EventKind) -> Option<&FlightEvent> {
        self.events.iter().find(|event| &event.kind == kind)
    }
}

/// Aggregate of a Monte Carlo batch. Landing positions are the first
/// successful runs in iteration order, not a representative subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispersionStatistics {
    pub success: bool,
    pub num_requested: usize,
    pub num_simulations: usize,
    pub apogee_mean: f64,
    pub apogee_std: f64,
    pub apogee_min: f64,
    pub apogee_max: f64,
    pub landing_dispersion_mean: f64,
    pub landing_dispersion_std: f64,
    pub landing_positions: Vec<[f64; 2]>,
}
