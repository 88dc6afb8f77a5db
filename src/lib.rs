pub mod analysis;
pub mod atmosphere;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod errors;
pub mod model;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use constants::*;
pub use errors::{ConfigError, EngineError, EngineUnavailable};

pub use config::{DispersionConfig, Fidelity, Scenario, ScenarioConfig};
pub use model::{
    DispersionStatistics, Environment, FlightParameters, Rocket, SimulationResult,
};

// Re-export commonly used items from analysis
pub use analysis::dispersion::{run_dispersion, run_dispersion_parallel};
pub use analysis::stability::{estimate_stability, StabilityClass, StabilityReport};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::engine::{FlightEngine, FlightSolution};
pub use trajectory_system::service::{TrajectoryProvider, TrajectoryService};

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::Telemetry;

pub use atmosphere::isa;
pub use catalog::MotorCatalog;

// Re-export commonly used utilities
pub use utils::vector3d::Vector3D;
