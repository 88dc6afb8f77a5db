//! International Standard Atmosphere: linear lapse in the troposphere,
//! isothermal above 11 km.

use serde::Serialize;

use crate::constants::{
    AIR_GAS_CONSTANT, AIR_MOLAR_MASS, EARTH_RADIUS, GRAVITY, HEAT_CAPACITY_RATIO,
    SEA_LEVEL_PRESSURE, SEA_LEVEL_TEMPERATURE, TROPOPAUSE_TEMPERATURE, TROPOSPHERE_HEIGHT,
    TROPOSPHERE_LAPSE_RATE, UNIVERSAL_GAS_CONSTANT,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtmosphereProperties {
    pub altitude: f64,            // m
    pub temperature: f64,         // K
    pub temperature_celsius: f64, // °C
    pub pressure: f64,            // Pa
    pub density: f64,             // kg/m³
    pub speed_of_sound: f64,      // m/s
    pub gravity: f64,             // m/s²
}

/// Properties at geometric `altitude` above sea level. Negative altitudes
/// are evaluated as sea level.
pub fn isa(altitude: f64) -> AtmosphereProperties {
    let h = altitude.max(0.0);
    let exponent = GRAVITY * AIR_MOLAR_MASS / (UNIVERSAL_GAS_CONSTANT * TROPOSPHERE_LAPSE_RATE);

    let (temperature, pressure) = if h < TROPOSPHERE_HEIGHT {
        let temperature = SEA_LEVEL_TEMPERATURE - TROPOSPHERE_LAPSE_RATE * h;
        let pressure = SEA_LEVEL_PRESSURE * (temperature / SEA_LEVEL_TEMPERATURE).powf(exponent);
        (temperature, pressure)
    } else {
        let tropopause_pressure =
            SEA_LEVEL_PRESSURE * (TROPOPAUSE_TEMPERATURE / SEA_LEVEL_TEMPERATURE).powf(exponent);
        let pressure = tropopause_pressure
            * (-GRAVITY * AIR_MOLAR_MASS * (h - TROPOSPHERE_HEIGHT)
                / (UNIVERSAL_GAS_CONSTANT * TROPOPAUSE_TEMPERATURE))
                .exp();
        (TROPOPAUSE_TEMPERATURE, pressure)
    };

    AtmosphereProperties {
        altitude: h,
        temperature,
        temperature_celsius: temperature - 273.15,
        pressure,
        density: pressure / (AIR_GAS_CONSTANT * temperature),
        speed_of_sound: (HEAT_CAPACITY_RATIO * AIR_GAS_CONSTANT * temperature).sqrt(),
        gravity: GRAVITY * (EARTH_RADIUS / (EARTH_RADIUS + h)).powi(2),
    }
}

/// Altitude at which the standard atmosphere has `pressure`; inverse of [`isa`].
pub fn pressure_altitude(pressure: f64) -> f64 {
    let exponent = GRAVITY * AIR_MOLAR_MASS / (UNIVERSAL_GAS_CONSTANT * TROPOSPHERE_LAPSE_RATE);
    let tropopause_pressure =
        SEA_LEVEL_PRESSURE * (TROPOPAUSE_TEMPERATURE / SEA_LEVEL_TEMPERATURE).powf(exponent);

    if pressure > tropopause_pressure {
        let temperature = SEA_LEVEL_TEMPERATURE * (pressure / SEA_LEVEL_PRESSURE).powf(1.0 / exponent);
        (SEA_LEVEL_TEMPERATURE - temperature) / TROPOSPHERE_LAPSE_RATE
    } else {
        TROPOSPHERE_HEIGHT
            - (pressure / tropopause_pressure).ln() * UNIVERSAL_GAS_CONSTANT * TROPOPAUSE_TEMPERATURE
                / (GRAVITY * AIR_MOLAR_MASS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sea_level() {
        let air = isa(0.0);
        assert_relative_eq!(air.temperature, 288.15);
        assert_relative_eq!(air.pressure, 101_325.0);
        assert_relative_eq!(air.density, 1.225, epsilon = 1e-3);
        assert_relative_eq!(air.speed_of_sound, 340.3, epsilon = 0.1);
        assert_relative_eq!(air.gravity, 9.81);
    }

    #[test]
    fn test_troposphere_and_tropopause() {
        let air = isa(5000.0);
        assert_relative_eq!(air.temperature, 255.65, epsilon = 1e-9);
        assert!(air.pressure < 101_325.0 && air.pressure > 50_000.0);

        let above = isa(15_000.0);
        assert_relative_eq!(above.temperature, 216.65);
        assert_relative_eq!(above.temperature_celsius, -56.5, epsilon = 1e-9);
        assert!(above.density < isa(11_000.0).density);
        assert!(above.gravity < 9.81);
    }

    #[test]
    fn test_pressure_is_continuous_at_tropopause() {
        let below = isa(10_999.999).pressure;
        let above = isa(11_000.0).pressure;
        assert_relative_eq!(below, above, max_relative = 1e-6);
    }

    #[test]
    fn test_pressure_altitude_inverts_isa() {
        for altitude in [0.0, 850.0, 4_000.0, 10_500.0, 18_000.0] {
            assert_relative_eq!(
                pressure_altitude(isa(altitude).pressure),
                altitude,
                epsilon = 1e-6
            );
        }
    }
}
