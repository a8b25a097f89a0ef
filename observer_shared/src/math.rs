//! Math types.
//!
//! Small and deterministic; just what the interpolator needs.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Threshold below which two positions count as the same place.
pub const POSITION_EPSILON: f32 = 1e-4;

/// 3D vector. The world is laid out on the XZ plane; Y is up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.len_sq().sqrt()
    }

    /// Unit vector in the same direction; `ZERO` stays `ZERO`.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }

    /// True when the two positions are closer than [`POSITION_EPSILON`].
    pub fn almost_eq(self, other: Self) -> bool {
        (self - other).len_sq() < POSITION_EPSILON * POSITION_EPSILON
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_unit_length() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
    }

    #[test]
    fn almost_eq_threshold() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        assert!(a.almost_eq(Vec3::new(1.0 + 1e-6, 0.0, 0.0)));
        assert!(!a.almost_eq(Vec3::new(1.1, 0.0, 0.0)));
    }
}
