pub mod aerodynamics;
pub mod engine;
pub mod fallback;
#[cfg(feature = "point-mass-engine")]
pub mod point_mass;
pub mod service;
pub mod triggers;
