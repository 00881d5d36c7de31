//! Two-dimensional vector value type.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Immutable 2D vector in grid-cell units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` degrees (0° is +x, 90° is +y).
    pub fn from_degrees(angle: f64) -> Self {
        let rad = angle.to_radians();
        Self::new(rad.cos(), rad.sin())
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector with the same direction, or zero for the zero vector.
    pub fn normalize(self) -> Self {
        self.with_length(1.0)
    }

    /// Vector with the same direction rescaled to `len`, or zero for the zero vector.
    pub fn with_length(self, len: f64) -> Self {
        let cur = self.length();
        if cur == 0.0 {
            return Self::ZERO;
        }
        self.scale(len / cur)
    }
}

impl Add for Vector {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        self.scale(factor)
    }
}
