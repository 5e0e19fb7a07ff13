//! World-edge half-planes.
//!
//! Grounded on the teacher's `SIZE`-derived world extent used throughout
//! `physics/rigidbody.rs` (e.g. `solve` clamping `pos.y` to `SIZE.h`);
//! generalized here into proper rigid half-plane bodies so the same
//! collision narrow-phase handles bodies-against-walls uniformly.

use crate::math::Vector2;

/// Which edge of the viewport a boundary represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySide {
    Top,
    Right,
    Bottom,
    Left,
}

/// A single rigid, infinitely massive half-plane clipped to a viewport edge.
#[derive(Debug, Clone, Copy)]
pub struct Boundary {
    pub side: BoundarySide,
    /// Unit normal pointing into the playable area.
    pub normal: Vector2,
    /// A point the plane passes through.
    pub point: Vector2,
}

impl Boundary {
    fn new(side: BoundarySide, normal: Vector2, point: Vector2) -> Self {
        Self {
            side,
            normal,
            point,
        }
    }

    /// Signed distance from `pos` to this boundary's plane; negative means
    /// `pos` has crossed past the wall.
    pub fn signed_distance(&self, pos: Vector2) -> f64 {
        (pos - self.point).dot(self.normal)
    }
}

/// Owns the up-to-four walls bounding the playable viewport.
#[derive(Debug, Clone, Default)]
pub struct BoundaryManager {
    boundaries: Vec<Boundary>,
}

impl BoundaryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild all four walls from a viewport size, replacing any previous
    /// set (e.g. on resize).
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.boundaries = vec![
            Boundary::new(BoundarySide::Top, Vector2::new(0.0, 1.0), Vector2::new(0.0, 0.0)),
            Boundary::new(
                BoundarySide::Right,
                Vector2::new(-1.0, 0.0),
                Vector2::new(width, 0.0),
            ),
            Boundary::new(
                BoundarySide::Bottom,
                Vector2::new(0.0, -1.0),
                Vector2::new(0.0, height),
            ),
            Boundary::new(BoundarySide::Left, Vector2::new(1.0, 0.0), Vector2::new(0.0, 0.0)),
        ];
    }

    /// Add an extra wall beyond the default rectangular viewport (e.g. a
    /// diagonal ramp). Rare; most hosts only ever use `set_viewport`.
    pub fn push_custom(&mut self, boundary: Boundary) {
        self.boundaries.push(boundary);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Boundary> {
        self.boundaries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_boundary_signed_distance() {
        let mut manager = BoundaryManager::new();
        manager.set_viewport(800.0, 600.0);
        let bottom = manager
            .iter()
            .find(|b| b.side == BoundarySide::Bottom)
            .unwrap();
        assert!((bottom.signed_distance(Vector2::new(400.0, 590.0)) - 10.0).abs() < 1e-9);
        assert!(bottom.signed_distance(Vector2::new(400.0, 610.0)) < 0.0);
    }
}
