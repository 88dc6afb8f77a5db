//! First-order static stability: nose and fin normal-force contributions
//! only. Body tube and boat-tail terms are ignored.

use std::fmt;

use serde::Serialize;

use crate::constants::{
    DEFAULT_NOSE_LENGTH, FINLESS_CP_POSITION, FINLESS_NORMAL_FORCE_SLOPE, MARGINAL_MARGIN,
    NOSE_NORMAL_FORCE_SLOPE, OGIVE_CP_FACTOR, STABLE_MARGIN,
};
use crate::model::{FinSet, Rocket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    Stable,
    MarginallyStable,
    Unstable,
}

impl StabilityClass {
    pub fn from_margin(margin: f64) -> Self {
        if margin > STABLE_MARGIN {
            StabilityClass::Stable
        } else if margin > MARGINAL_MARGIN {
            StabilityClass::MarginallyStable
        } else {
            StabilityClass::Unstable
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            StabilityClass::Stable => "Stable",
            StabilityClass::MarginallyStable => "Marginally stable",
            StabilityClass::Unstable => "Unstable - add weight to nose or move fins aft",
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StabilityClass::Stable => "stable",
            StabilityClass::MarginallyStable => "marginally stable",
            StabilityClass::Unstable => "unstable",
        };
        write!(f, "{}", label)
    }
}

/// Weighted center of pressure and the slopes that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureCenter {
    pub cp: f64,
    pub nose_cn: f64,
    pub fin_cn: f64,
}

/// Center of pressure from the nose tip. Without fins a fixed slope of 4
/// acting at 0.2 m stands in for the tail.
pub fn center_of_pressure(nose_length: f64, fins: Option<&FinSet>, body_radius: f64) -> PressureCenter {
    let nose_cp = OGIVE_CP_FACTOR * nose_length;
    let nose_cn = NOSE_NORMAL_FORCE_SLOPE;

    let (fin_cp, fin_cn) = match fins {
        Some(fins) => (fins.center_of_pressure(), fins.normal_force_slope(body_radius)),
        None => (FINLESS_CP_POSITION, FINLESS_NORMAL_FORCE_SLOPE),
    };

    PressureCenter {
        cp: (nose_cn * nose_cp + fin_cn * fin_cp) / (nose_cn + fin_cn),
        nose_cn,
        fin_cn,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityReport {
    pub cp: f64,
    pub cg: f64,
    pub margin_calibers: f64,
    pub nose_cn: f64,
    pub fin_cn: f64,
    pub stable: bool,
    pub classification: StabilityClass,
    pub recommendation: String,
}

pub fn estimate_stability(rocket: &Rocket) -> StabilityReport {
    let nose_length = rocket
        .nose
        .as_ref()
        .map_or(DEFAULT_NOSE_LENGTH, |nose| nose.length);
    let pressure = center_of_pressure(nose_length, rocket.fins.as_ref(), rocket.radius);

    let cg = rocket.center_of_mass;
    let margin = (pressure.cp - cg) / rocket.diameter();
    let classification = StabilityClass::from_margin(margin);

    StabilityReport {
        cp: pressure.cp,
        cg,
        margin_calibers: margin,
        nose_cn: pressure.nose_cn,
        fin_cn: pressure.fin_cn,
        stable: margin > MARGINAL_MARGIN,
        classification,
        recommendation: classification.recommendation().to_string(),
    }
}
