use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::atmosphere::{isa, pressure_altitude};
use crate::errors::EngineError;
use crate::model::{Parachute, SensorNoise};

/// First-order autoregressive noise on a sensed signal:
/// `x_k = c * x_{k-1} + sqrt(1 - c²) * w_k`, `w_k ~ N(0, std)`, output `mean + x_k`.
#[derive(Debug, Clone)]
pub struct NoisySensor {
    mean: f64,
    correlation: f64,
    innovation: Normal<f64>,
    state: f64,
}

impl NoisySensor {
    pub fn new(noise: &SensorNoise) -> Result<Self, EngineError> {
        let innovation = Normal::new(0.0, noise.std_dev)
            .map_err(|e| EngineError::Engine(format!("Invalid sensor noise: {}", e)))?;
        Ok(NoisySensor {
            mean: noise.mean,
            correlation: noise.correlation,
            innovation,
            state: 0.0,
        })
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let w = self.innovation.sample(rng);
        self.state = self.correlation * self.state + (1.0 - self.correlation.powi(2)).sqrt() * w;
        self.mean + self.state
    }
}

/// Deployment logic for one parachute: samples the trigger at the
/// parachute's own rate on noisy barometric altitude, then waits out the lag.
#[derive(Debug, Clone)]
pub struct ParachuteController {
    pub parachute: Parachute,
    sensor: NoisySensor,
    next_sample: f64,
    triggered_at: Option<f64>,
    deployed_at: Option<f64>,
}

impl ParachuteController {
    pub fn new(parachute: &Parachute) -> Result<Self, EngineError> {
        Ok(ParachuteController {
            sensor: NoisySensor::new(&parachute.noise)?,
            parachute: parachute.clone(),
            next_sample: 0.0,
            triggered_at: None,
            deployed_at: None,
        })
    }

    /// Advances the controller to `time`. `altitude` is above the launch
    /// site, `elevation` the site height above sea level. Returns the
    /// deployment time when the canopy opens during this call.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        time: f64,
        altitude: f64,
        elevation: f64,
        vertical_velocity: f64,
        rng: &mut R,
    ) -> Option<f64> {
        if self.deployed_at.is_some() {
            return None;
        }

        if self.triggered_at.is_none() {
            while self.next_sample <= time {
                self.next_sample += 1.0 / self.parachute.sampling_rate;
                let pressure = isa(elevation + altitude).pressure + self.sensor.next(rng);
                let sensed_altitude = pressure_altitude(pressure) - elevation;
                if self
                    .parachute
                    .trigger
                    .is_satisfied(sensed_altitude, vertical_velocity)
                {
                    self.triggered_at = Some(time);
                    break;
                }
            }
        }

        match self.triggered_at {
            Some(triggered) if time >= triggered + self.parachute.lag => {
                let deployed = triggered + self.parachute.lag;
                self.deployed_at = Some(deployed);
                Some(deployed)
            }
            _ => None,
        }
    }

    /// Drag area currently contributed, zero until deployment.
    pub fn drag_area(&self) -> f64 {
        if self.deployed_at.is_some() {
            self.parachute.cd_s
        } else {
            0.0
        }
    }

    pub fn deployed_at(&self) -> Option<f64> {
        self.deployed_at
    }
}
