use serde::{Deserialize, Serialize};

use crate::config::{FinConfig, NoseConfig};
use crate::constants::FIN_CP_ROOT_CHORD_FACTOR;
use crate::errors::ConfigError;

use super::{require_non_negative, require_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoseShape {
    Conical,
    #[default]
    Ogive,
    Tangent,
    Elliptical,
    Parabolic,
    #[serde(alias = "vonKarman", alias = "von_karman")]
    VonKarman,
    #[serde(alias = "lvHaack", alias = "lvhaack")]
    LvHaack,
    #[serde(alias = "powerSeries", alias = "powerseries")]
    PowerSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoseCone {
    pub length: f64,
    pub shape: NoseShape,
    pub base_radius: f64,
}

impl NoseCone {
    /// Builds the nose; the base radius defaults to the body radius.
    pub fn from_config(config: &NoseConfig, body_radius: f64) -> Result<Self, ConfigError> {
        Ok(NoseCone {
            length: require_positive("nose length", config.length)?,
            shape: config.kind,
            base_radius: require_positive(
                "nose base_radius",
                config.base_radius.unwrap_or(body_radius),
            )?,
        })
    }
}

/// Trapezoidal fin set. `position` is the axial offset of the fin root
/// leading edge, negative aft of the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct FinSet {
    pub count: u32,
    pub root_chord: f64,
    pub tip_chord: f64,
    pub span: f64,
    pub sweep_length: Option<f64>,
    pub sweep_angle: Option<f64>,
    pub cant_angle: f64,
    pub position: f64,
}

impl FinSet {
    /// Normal-force coefficient slope of the whole set on a body of `body_radius`.
    pub fn normal_force_slope(&self, body_radius: f64) -> f64 {
        4.0 * self.count as f64 * (self.span / (2.0 * body_radius)).powi(2)
    }

    /// Center of pressure measured from the nose tip.
    pub fn center_of_pressure(&self) -> f64 {
        self.position.abs() + FIN_CP_ROOT_CHORD_FACTOR * self.root_chord
    }
}

impl TryFrom<&FinConfig> for FinSet {
    type Error = ConfigError;

    fn try_from(config: &FinConfig) -> Result<Self, Self::Error> {
        if config.n < 1 {
            return Err(ConfigError::InvalidFinCount(config.n));
        }
        if let Some(sweep) = config.sweep_length {
            require_non_negative("fin sweep_length", sweep)?;
        }
        Ok(FinSet {
            count: config.n,
            root_chord: require_positive("fin root_chord", config.root_chord)?,
            tip_chord: require_non_negative("fin tip_chord", config.tip_chord)?,
            span: require_positive("fin span", config.span)?,
            sweep_length: config.sweep_length,
            sweep_angle: config.sweep_angle,
            cant_angle: config.cant_angle,
            position: config.position,
        })
    }
}
