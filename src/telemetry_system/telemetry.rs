use crate::analysis::stability::StabilityReport;
use crate::atmosphere::AtmosphereProperties;
use crate::catalog::MotorDescriptor;
use crate::model::{DispersionStatistics, SimulationResult, TrajectorySample};
use crate::utils::vector3d::Vector3D;

/// Human-readable report built section by section, printed at the end of a
/// command.
#[derive(Debug, Default)]
pub struct Telemetry {
    pub log: Vec<String>,
}

impl Telemetry {
    pub fn new() -> Self {
        Telemetry { log: Vec::new() }
    }

    fn format_vector3d(vec: &Vector3D, unit: &str, precision: usize) -> String {
        format!(
            "x = {:.precision$} {unit}, y = {:.precision$} {unit}, z = {:.precision$} {unit}",
            vec.x,
            vec.y,
            vec.z,
            precision = precision,
            unit = unit
        )
    }

    pub(crate) fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 3600.0 {
            let hours = (elapsed_time / 3600.0).floor();
            let minutes = ((elapsed_time % 3600.0) / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}h {:.0}m {:.2}s", hours, minutes, seconds)
        } else if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    pub(crate) fn format_altitude(altitude: f64) -> String {
        if altitude.abs() >= 1000.0 {
            format!("{:.2} km", altitude / 1000.0)
        } else {
            format!("{:.2} m", altitude)
        }
    }

    fn format_sample(sample: &TrajectorySample) -> String {
        format!(
            "Time: {}\n\
                 Position: {}\n\
                 Velocity: {} (Magnitude: {:.2} m/s)\n\
                 Acceleration: {} (Magnitude: {:.2} m/s²)\n\
                 Mach: {:.3}, Dynamic pressure: {:.1} Pa\n\
                 Pitch: {:.2}°, Yaw: {:.2}°, AoA: {:.2}°\n",
            Self::format_time(sample.time),
            Self::format_vector3d(&sample.position, "m", 2),
            Self::format_vector3d(&sample.velocity, "m/s", 2),
            sample.velocity.magnitude(),
            Self::format_vector3d(&sample.acceleration, "m/s²", 2),
            sample.acceleration.magnitude(),
            sample.mach,
            sample.dynamic_pressure,
            sample.pitch,
            sample.yaw,
            sample.angle_of_attack,
        )
    }

    /// Adds a flight summary. With `trace_every = Some(n)` every n-th
    /// trajectory sample is listed too.
    pub fn record_flight(&mut self, result: &SimulationResult, trace_every: Option<usize>) {
        if let Some(step) = trace_every.filter(|step| *step > 0) {
            let mut trace = String::from("--- Trajectory ---\n");
            for sample in result.trajectory.iter().step_by(step) {
                trace.push_str(&Self::format_sample(sample));
            }
            trace.push_str("--- End of Trajectory ---");
            self.log.push(trace);
        }

        if !result.success {
            self.log
                .push(format!("--- Flight Failed ---\n{}", result.message));
            return;
        }

        let summary = &result.summary;
        self.log.push(format!(
            "--- Flight Summary ---\n\
                 Provider: {}\n\
                 Apogee: {} at {}\n\
                 Max Velocity: {:.2} m/s at {}\n\
                 Max Acceleration: {:.2} m/s²\n\
                 Max Mach: {:.3}\n\
                 Rail Exit Velocity: {:.2} m/s\n\
                 Flight Time: {}\n\
                 Landing: {:.2} m/s at x = {:.1} m, y = {:.1} m\n\
                 Static Margin: {:.2} cal (liftoff), {:.2} cal (burnout)",
            result.message,
            Self::format_altitude(summary.apogee),
            Self::format_time(summary.apogee_time),
            summary.max_velocity,
            Self::format_time(summary.max_velocity_time),
            summary.max_acceleration,
            summary.max_mach,
            summary.out_of_rail_velocity,
            Self::format_time(summary.flight_time),
            summary.landing_velocity,
            summary.landing_position[0],
            summary.landing_position[1],
            result.stability.initial,
            result.stability.burnout,
        ));

        let mut events = String::from("--- Events ---");
        for event in &result.events {
            events.push_str(&format!(
                "\n{} at {}",
                event.kind.label(),
                Self::format_time(event.time)
            ));
            if let Some(altitude) = event.altitude {
                events.push_str(&format!(", altitude {}", Self::format_altitude(altitude)));
            }
            if let Some(velocity) = event.velocity {
                events.push_str(&format!(", velocity {:.2} m/s", velocity));
            }
        }
        self.log.push(events);
    }

    pub fn record_stability(&mut self, report: &StabilityReport) {
        self.log.push(format!(
            "--- Stability ---\n\
                 CP: {:.3} m, CG: {:.3} m\n\
                 Static Margin: {:.2} calibers\n\
                 Normal Force Slope: nose {:.2}, fins {:.2}\n\
                 {}",
            report.cp,
            report.cg,
            report.margin_calibers,
            report.nose_cn,
            report.fin_cn,
            report.recommendation,
        ));
    }

    pub fn record_dispersion(&mut self, statistics: &DispersionStatistics) {
        if !statistics.success {
            self.log.push(format!(
                "--- Dispersion ---\nNo successful runs out of {}",
                statistics.num_requested
            ));
            return;
        }

        self.log.push(format!(
            "--- Dispersion ---\n\
                 Runs: {}/{}\n\
                 Apogee: {} ± {:.2} m (min {}, max {})\n\
                 Landing Radius: {:.2} ± {:.2} m",
            statistics.num_simulations,
            statistics.num_requested,
            Self::format_altitude(statistics.apogee_mean),
            statistics.apogee_std,
            Self::format_altitude(statistics.apogee_min),
            Self::format_altitude(statistics.apogee_max),
            statistics.landing_dispersion_mean,
            statistics.landing_dispersion_std,
        ));
    }

    pub fn record_atmosphere(&mut self, air: &AtmosphereProperties) {
        self.log.push(format!(
            "--- Standard Atmosphere at {} ---\n\
                 Temperature: {:.2} K ({:.2} °C)\n\
                 Pressure: {:.1} Pa\n\
                 Air Density: {:.4} kg/m³\n\
                 Speed of Sound: {:.2} m/s\n\
                 Gravity: {:.4} m/s²",
            Self::format_altitude(air.altitude),
            air.temperature,
            air.temperature_celsius,
            air.pressure,
            air.density,
            air.speed_of_sound,
            air.gravity,
        ));
    }

    pub fn record_motors(&mut self, motors: &[&MotorDescriptor]) {
        let mut table = format!("--- Motors ({}) ---", motors.len());
        for motor in motors {
            table.push_str(&format!(
                "\n{:<16} {:<12} {:>2} {:>7.1} Ns {:>6.1} N avg {:>5.2}s",
                motor.id,
                motor.manufacturer,
                motor.impulse_class,
                motor.total_impulse,
                motor.avg_thrust,
                motor.burn_time,
            ));
        }
        self.log.push(table);
    }

    pub fn render(&self) -> String {
        self.log.join("\n\n")
    }

    pub fn display_data(&self) {
        println!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atmosphere::isa;
    use crate::model::{EventKind, FlightEvent};

    #[test]
    fn test_format_time() {
        assert_eq!(Telemetry::format_time(12.345), "12.35s");
        assert_eq!(Telemetry::format_time(75.5), "1m 15.50s");
        assert_eq!(Telemetry::format_time(3725.0), "1h 2m 5.00s");
    }

    #[test]
    fn test_format_altitude() {
        assert_eq!(Telemetry::format_altitude(512.0), "512.00 m");
        assert_eq!(Telemetry::format_altitude(1500.0), "1.50 km");
    }

    #[test]
    fn test_failed_flight_only_reports_message() {
        let mut telemetry = Telemetry::new();
        telemetry.record_flight(&SimulationResult::failure("engine exploded"), None);
        assert_eq!(telemetry.log.len(), 1);
        assert!(telemetry.render().contains("engine exploded"));
    }

    #[test]
    fn test_flight_report_lists_events() {
        let result = SimulationResult {
            success: true,
            message: "test".to_string(),
            events: vec![
                FlightEvent::new(EventKind::Liftoff, 0.0).with_altitude(0.0),
                FlightEvent::new(EventKind::Landing, 30.0).with_velocity(-5.0),
            ],
            ..Default::default()
        };
        let mut telemetry = Telemetry::new();
        telemetry.record_flight(&result, None);
        let report = telemetry.render();

        assert!(report.contains("liftoff at 0.00s"));
        assert!(report.contains("landing at 30.00s, velocity -5.00 m/s"));
    }

    #[test]
    fn test_atmosphere_section() {
        let mut telemetry = Telemetry::new();
        telemetry.record_atmosphere(&isa(0.0));
        assert!(telemetry.render().contains("101325.0 Pa"));
    }
}
