// Physical Constants
pub const GRAVITY: f64 = 9.81; // m/s²
pub const EARTH_RADIUS: f64 = 6_371_000.0; // meters

// Environmental Constants
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15; // K
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0; // Pa
pub const TROPOSPHERE_LAPSE_RATE: f64 = 0.0065; // K/m
pub const TROPOSPHERE_HEIGHT: f64 = 11_000.0; // m
pub const TROPOPAUSE_TEMPERATURE: f64 = 216.65; // K
pub const AIR_MOLAR_MASS: f64 = 0.029; // kg/mol
pub const UNIVERSAL_GAS_CONSTANT: f64 = 8.314; // J/(mol·K)
pub const AIR_GAS_CONSTANT: f64 = 287.05; // J/(kg·K)
pub const HEAT_CAPACITY_RATIO: f64 = 1.4;

// Aerodynamic Constants
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225; // kg/m³
pub const SEA_LEVEL_SOUND_SPEED: f64 = 340.0; // m/s, used uncorrected by the reduced-order model

// Stability Estimation
pub const OGIVE_CP_FACTOR: f64 = 0.466; // nose CP as a fraction of nose length
pub const NOSE_NORMAL_FORCE_SLOPE: f64 = 2.0;
pub const FINLESS_NORMAL_FORCE_SLOPE: f64 = 4.0;
pub const FINLESS_CP_POSITION: f64 = 0.2; // m from nose tip
pub const FIN_CP_ROOT_CHORD_FACTOR: f64 = 0.4;
pub const STABLE_MARGIN: f64 = 1.5; // calibers
pub const MARGINAL_MARGIN: f64 = 1.0; // calibers

// Placeholder margins for runs without a real margin accessor
pub const SENTINEL_STATIC_MARGIN: f64 = 2.0; // calibers
pub const NOMINAL_BURNOUT_MARGIN: f64 = 2.5; // calibers

// Default Airframe
pub const DEFAULT_NOSE_LENGTH: f64 = 0.1; // m
pub const MOTOR_OFFSET_FACTOR: f64 = 0.8; // motor sits this fraction of CG aft of CG

// Simulation Parameters
pub const FALLBACK_HORIZON_FACTOR: f64 = 2.5; // run horizon as a multiple of apogee time
pub const MAX_LANDING_SAMPLES: usize = 100;
pub const DEFAULT_OUTPUT_RATE: f64 = 100.0; // Hz
