use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::Serialize;

/// East-North-Up vector, origin at the launch site.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D { x, y, z }
    }

    pub fn zeros() -> Self {
        Vector3D::new(0.0, 0.0, 0.0)
    }

    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    pub fn horizontal_magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag == 0.0 {
            *self
        } else {
            Vector3D::new(self.x / mag, self.y / mag, self.z / mag)
        }
    }

    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Angle to `other` in radians, zero when either vector is null.
    pub fn angle_to(&self, other: &Vector3D) -> f64 {
        let denom = self.magnitude() * other.magnitude();
        if denom == 0.0 {
            0.0
        } else {
            (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
        }
    }

    /// Elevation above the horizontal plane in radians.
    pub fn elevation(&self) -> f64 {
        self.z.atan2(self.horizontal_magnitude())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn lerp(&self, other: &Vector3D, fraction: f64) -> Self {
        *self + (*other - *self) * fraction
    }
}

impl Sum for Vector3D {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vector3D::zeros(), |a, b| a + b)
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Vector3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Vector3D::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Vector3D> for f64 {
    type Output = Vector3D;

    fn mul(self, vector: Vector3D) -> Vector3D {
        Vector3D::new(self * vector.x, self * vector.y, self * vector.z)
    }
}

impl Div<f64> for Vector3D {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Vector3D::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_magnitude_and_normalize() {
        let v = Vector3D::new(3.0, 4.0, 12.0);
        assert_relative_eq!(v.magnitude(), 13.0);
        assert_relative_eq!(v.normalize().magnitude(), 1.0, epsilon = 1e-12);
        assert_eq!(Vector3D::zeros().normalize(), Vector3D::zeros());
    }

    #[test]
    fn test_angle_and_elevation() {
        let up = Vector3D::new(0.0, 0.0, 1.0);
        let east = Vector3D::new(1.0, 0.0, 0.0);
        assert_relative_eq!(up.angle_to(&east), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(up.elevation(), FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(up.angle_to(&Vector3D::zeros()), 0.0);
    }

    #[test]
    fn test_lerp() {
        let a = Vector3D::new(0.0, 0.0, 0.0);
        let b = Vector3D::new(2.0, 4.0, 6.0);
        assert_eq!(a.lerp(&b, 0.5), Vector3D::new(1.0, 2.0, 3.0));
    }
}
