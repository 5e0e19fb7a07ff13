//! Vector and rotation primitives shared by every other module.
//!
//! Rotation is stored as degrees normalized to `[0, 360)` rather than as raw
//! sine/cosine parts: the narrow phase and the renderer-facing contract both
//! want degrees directly, and normalizing on every mutation means a drifting
//! sum of small increments can never sneak outside the representable range.

use vek::Vec2;

/// A 2D vector with double-precision components.
pub type Vector2 = Vec2<f64>;

/// An orientation in degrees, always kept in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    degrees: f64,
}

impl Rotation {
    /// No rotation.
    pub fn zero() -> Self {
        Self { degrees: 0.0 }
    }

    /// Construct from degrees, normalizing into `[0, 360)`.
    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            degrees: Self::normalize(degrees),
        }
    }

    /// Construct from radians, normalizing into `[0, 360)`.
    pub fn from_radians(radians: f64) -> Self {
        Self::from_degrees(radians.to_degrees())
    }

    /// Current value in degrees, always `[0, 360)`.
    pub fn to_degrees(self) -> f64 {
        self.degrees
    }

    /// Current value in radians.
    pub fn to_radians(self) -> f64 {
        self.degrees.to_radians()
    }

    /// Rotate a point around the origin by this rotation.
    pub fn rotate(&self, point: Vector2) -> Vector2 {
        let (sin, cos) = self.to_radians().sin_cos();
        Vector2::new(
            point.x * cos - point.y * sin,
            point.x * sin + point.y * cos,
        )
    }

    /// Add a delta in degrees, re-normalizing afterwards.
    ///
    /// Normalizing *after* the addition (never before) is what keeps the
    /// value from transiently exceeding 360 mid-update.
    pub fn add_degrees(&mut self, delta: f64) {
        self.degrees = Self::normalize(self.degrees + delta);
    }

    fn normalize(degrees: f64) -> f64 {
        let wrapped = degrees % 360.0;
        if wrapped < 0.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::zero()
    }
}

/// An axis-aligned bounding box.
pub type BoundRect = vek::Aabr<f64>;

#[cfg(test)]
mod tests {
    use super::{Rotation, Vector2};

    #[test]
    fn normalizes_into_range() {
        assert_eq!(Rotation::from_degrees(370.0).to_degrees(), 10.0);
        assert_eq!(Rotation::from_degrees(-10.0).to_degrees(), 350.0);
        assert_eq!(Rotation::from_degrees(0.0).to_degrees(), 0.0);
    }

    #[test]
    fn add_degrees_wraps() {
        let mut a = Rotation::from_degrees(350.0);
        a.add_degrees(20.0);
        assert_eq!(a.to_degrees(), 10.0);

        let mut b = Rotation::from_degrees(10.0);
        b.add_degrees(-20.0);
        assert_eq!(b.to_degrees(), 350.0);
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = Rotation::from_degrees(90.0);
        let rotated = r.rotate(Vector2::new(1.0, 0.0));
        assert!(rotated.x.abs() < 1e-9);
        assert!((rotated.y - 1.0).abs() < 1e-9);
    }
}
