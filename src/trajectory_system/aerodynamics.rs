use crate::atmosphere::AtmosphereProperties;
use crate::model::DragCurve;
use crate::utils::vector3d::Vector3D;

/// Axial drag of the airframe plus any open parachutes.
#[derive(Debug)]
pub struct Aerodynamics<'a> {
    pub power_off_drag: &'a DragCurve,
    pub power_on_drag: &'a DragCurve,
    pub reference_area: f64,
}

impl<'a> Aerodynamics<'a> {
    pub fn new(
        power_off_drag: &'a DragCurve,
        power_on_drag: &'a DragCurve,
        reference_area: f64,
    ) -> Self {
        Aerodynamics {
            power_off_drag,
            power_on_drag,
            reference_area,
        }
    }

    pub fn calculate_dynamic_pressure(&self, air_velocity: Vector3D, air: &AtmosphereProperties) -> f64 {
        0.5 * air.density * air_velocity.magnitude().powi(2)
    }

    pub fn calculate_mach(&self, air_velocity: Vector3D, air: &AtmosphereProperties) -> f64 {
        air_velocity.magnitude() / air.speed_of_sound
    }

    pub fn drag_coefficient(&self, mach: f64, powered: bool) -> f64 {
        if powered {
            self.power_on_drag.cd_at(mach)
        } else {
            self.power_off_drag.cd_at(mach)
        }
    }

    /// Drag force opposing `air_velocity` (vehicle velocity minus wind).
    /// `parachute_area` is the summed Cd·S of deployed canopies.
    pub fn calculate_drag(
        &self,
        air_velocity: Vector3D,
        air: &AtmosphereProperties,
        powered: bool,
        parachute_area: f64,
    ) -> Vector3D {
        if air_velocity.magnitude() <= 0.0 {
            return Vector3D::zeros();
        }
        let mach = self.calculate_mach(air_velocity, air);
        let dynamic_pressure = self.calculate_dynamic_pressure(air_velocity, air);
        let drag_area = self.drag_coefficient(mach, powered) * self.reference_area + parachute_area;

        -air_velocity.normalize() * (dynamic_pressure * drag_area)
    }
}
