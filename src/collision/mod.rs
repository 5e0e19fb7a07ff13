//! Broad-phase + narrow-phase collision detection.
//!
//! Grounded on the teacher's `physics::collision::CollisionState` (a
//! reusable manifold cache cleared and repopulated every step) and
//! `physics::collision::sat`, but the narrow phase here is hand-rolled
//! SAT/circle dispatch rather than a call into `parry2d_f64`'s
//! `DefaultQueryDispatcher`, per this crate's own narrow-phase
//! requirements.

pub mod sat;

use arrayvec::ArrayVec;
use itertools::Itertools;

use crate::body::{Body, BodyId, Shape, StaticKind};
use crate::boundary::{Boundary, BoundaryManager};
use crate::heap::BodyHeap;
use crate::math::Vector2;

/// One side of a contact: either a live body or a fixed world boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSide {
    Body(BodyId),
    Boundary(usize),
}

/// A single contact between two shapes.
#[derive(Debug, Clone)]
pub struct Manifold {
    pub a: ContactSide,
    pub b: ContactSide,
    /// Unit normal pointing from `a` towards `b`.
    pub normal: Vector2,
    pub penetration: f64,
    pub points: ArrayVec<Vector2, 2>,
}

/// Broad + narrow phase driver. Holds a reusable manifold buffer cleared
/// (not reallocated) every step.
#[derive(Default)]
pub struct CollisionManager {
    manifolds: Vec<Manifold>,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifolds(&self) -> &[Manifold] {
        &self.manifolds
    }

    /// Run broad phase then narrow phase, repopulating `self.manifolds`.
    /// Bodies participating in a fresh contact are woken before this
    /// returns so the resolver sees correct kinematics this same step.
    pub fn detect(&mut self, heap: &mut BodyHeap, boundaries: &BoundaryManager) {
        puffin::profile_function!();

        self.manifolds.clear();

        let ids: Vec<BodyId> = heap.ids().collect();

        for (a_id, b_id) in ids.iter().copied().tuple_combinations() {
            let (a, b) = (heap.get(a_id).unwrap(), heap.get(b_id).unwrap());

            if both_fully_static(a, b) {
                continue;
            }
            if !a.bound_rect().collides_with_aabr(b.bound_rect()) {
                continue;
            }

            if let Some(manifold) = narrow_phase_bodies(a_id, a, b_id, b) {
                self.manifolds.push(manifold);
            }
        }

        for (boundary_index, boundary) in boundaries.iter().enumerate() {
            for id in ids.iter().copied() {
                let body = heap.get(id).unwrap();
                if body.static_kind() == StaticKind::Total {
                    continue;
                }
                if let Some(manifold) = narrow_phase_boundary(id, body, boundary_index, boundary) {
                    self.manifolds.push(manifold);
                }
            }
        }

        for manifold in &self.manifolds {
            if let ContactSide::Body(id) = manifold.a {
                if let Some(body) = heap.get_mut(id) {
                    wake_on_contact(body);
                }
            }
            if let ContactSide::Body(id) = manifold.b {
                if let Some(body) = heap.get_mut(id) {
                    wake_on_contact(body);
                }
            }
        }
    }
}

fn wake_on_contact(body: &mut Body) {
    body.wake();
}

fn both_fully_static(a: &Body, b: &Body) -> bool {
    a.static_kind() != StaticKind::None && b.static_kind() != StaticKind::None
}

trait AabrExt {
    fn collides_with_aabr(&self, other: Self) -> bool;
}

impl AabrExt for crate::math::BoundRect {
    fn collides_with_aabr(&self, other: Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

fn narrow_phase_bodies(a_id: BodyId, a: &Body, b_id: BodyId, b: &Body) -> Option<Manifold> {
    match (&a.shape, &b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a_id, a.pos(), *ra, b_id, b.pos(), *rb)
        }
        (Shape::Circle { radius: r }, Shape::Polygon { .. }) => {
            circle_polygon(a_id, a.pos(), *r, b_id, b.world_vertices())
        }
        (Shape::Polygon { .. }, Shape::Circle { radius: r }) => {
            circle_polygon(b_id, b.pos(), *r, a_id, a.world_vertices()).map(flip_manifold)
        }
        (Shape::Polygon { .. }, Shape::Polygon { .. }) => {
            polygon_polygon(a_id, a.world_vertices(), b_id, b.world_vertices())
        }
    }
}

fn flip_manifold(manifold: Manifold) -> Manifold {
    Manifold {
        a: manifold.b,
        b: manifold.a,
        normal: -manifold.normal,
        penetration: manifold.penetration,
        points: manifold.points,
    }
}

fn circle_circle(
    a_id: BodyId,
    a_pos: Vector2,
    a_radius: f64,
    b_id: BodyId,
    b_pos: Vector2,
    b_radius: f64,
) -> Option<Manifold> {
    let delta = b_pos - a_pos;
    let distance = delta.magnitude();
    let combined_radius = a_radius + b_radius;
    if distance >= combined_radius {
        return None;
    }

    // Degenerate case: coincident centers. Pick an arbitrary upward normal
    // rather than dividing by zero.
    let normal = if distance <= f64::EPSILON {
        Vector2::new(0.0, -1.0)
    } else {
        delta / distance
    };

    let contact = a_pos + normal * a_radius;
    let mut points = ArrayVec::new();
    points.push(contact);

    Some(Manifold {
        a: ContactSide::Body(a_id),
        b: ContactSide::Body(b_id),
        normal,
        penetration: combined_radius - distance,
        points,
    })
}

fn circle_polygon(
    circle_id: BodyId,
    circle_pos: Vector2,
    radius: f64,
    polygon_id: BodyId,
    polygon_vertices: &[Vector2],
) -> Option<Manifold> {
    let n = polygon_vertices.len();
    let mut best_distance = f64::NEG_INFINITY;
    let mut best_edge = 0;

    let normals = sat::edge_normals(polygon_vertices);
    for (i, normal) in normals.iter().enumerate() {
        let distance = normal.dot(circle_pos - polygon_vertices[i]);
        if distance > best_distance {
            best_distance = distance;
            best_edge = i;
        }
    }

    if best_distance > radius {
        return None;
    }

    let a = polygon_vertices[best_edge];
    let b = polygon_vertices[(best_edge + 1) % n];

    let normal = if best_distance < 0.0 {
        // Center is inside the polygon: push out along the deepest edge.
        normals[best_edge]
    } else {
        let edge = b - a;
        let t = (circle_pos - a).dot(edge) / edge.magnitude_squared();
        if t < 0.0 {
            let dir = circle_pos - a;
            if dir.magnitude() > radius {
                return None;
            }
            dir.normalized()
        } else if t > 1.0 {
            let dir = circle_pos - b;
            if dir.magnitude() > radius {
                return None;
            }
            dir.normalized()
        } else {
            normals[best_edge]
        }
    };

    let penetration = radius - best_distance.max(-radius);
    let contact = circle_pos - normal * radius;
    let mut points = ArrayVec::new();
    points.push(contact);

    Some(Manifold {
        a: ContactSide::Body(circle_id),
        b: ContactSide::Body(polygon_id),
        normal: -normal,
        penetration,
        points,
    })
}

fn polygon_polygon(
    a_id: BodyId,
    a_vertices: &[Vector2],
    b_id: BodyId,
    b_vertices: &[Vector2],
) -> Option<Manifold> {
    let mtv = sat::minimum_translation(a_vertices, b_vertices)?;

    let (reference, incident, axis_towards_incident) = match mtv.reference {
        sat::ReferenceShape::A => (a_vertices, b_vertices, mtv.axis),
        sat::ReferenceShape::B => (b_vertices, a_vertices, -mtv.axis),
    };

    let clipped = sat::clip_contact_points(reference, incident, axis_towards_incident);
    let mut points = ArrayVec::new();
    for p in clipped.into_iter().take(2) {
        points.push(p);
    }
    if points.is_empty() {
        // Clipping degenerated (near-parallel faces); fall back to the
        // incident polygon's centroid-nearest vertex as a single contact.
        points.push(incident[0]);
    }

    Some(Manifold {
        a: ContactSide::Body(a_id),
        b: ContactSide::Body(b_id),
        normal: mtv.axis,
        penetration: mtv.overlap,
        points,
    })
}

fn narrow_phase_boundary(
    body_id: BodyId,
    body: &Body,
    boundary_index: usize,
    boundary: &Boundary,
) -> Option<Manifold> {
    match &body.shape {
        Shape::Circle { radius } => {
            let distance = boundary.signed_distance(body.pos());
            if distance >= *radius {
                return None;
            }
            let mut points = ArrayVec::new();
            points.push(body.pos() - boundary.normal * *radius);
            Some(Manifold {
                a: ContactSide::Body(body_id),
                b: ContactSide::Boundary(boundary_index),
                normal: -boundary.normal,
                penetration: radius - distance,
                points,
            })
        }
        Shape::Polygon { .. } => {
            let vertices = body.world_vertices();
            let mut deepest = f64::INFINITY;
            let mut contacts = ArrayVec::<Vector2, 2>::new();
            for vertex in vertices {
                let distance = boundary.signed_distance(*vertex);
                if distance < deepest {
                    deepest = distance;
                }
                if distance < 0.0 && !contacts.is_full() {
                    contacts.push(*vertex);
                }
            }
            if deepest >= 0.0 {
                return None;
            }
            if contacts.is_empty() {
                contacts.push(vertices[0]);
            }
            Some(Manifold {
                a: ContactSide::Body(body_id),
                b: ContactSide::Boundary(boundary_index),
                normal: -boundary.normal,
                penetration: -deepest,
                points: contacts,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyConfig, BodyKind, StaticKind};
    use crate::heap::BodyHeap;

    fn circle_body(pos: Vector2, radius: f64) -> crate::body::Body {
        crate::body::Body::new(
            BodyConfig {
                pos,
                shape: Shape::Circle { radius },
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap()
    }

    #[test]
    fn overlapping_circles_produce_manifold() {
        let mut heap = BodyHeap::new();
        heap.append(circle_body(Vector2::new(0.0, 0.0), 10.0)).unwrap();
        heap.append(circle_body(Vector2::new(15.0, 0.0), 10.0)).unwrap();

        let boundaries = BoundaryManager::new();
        let mut manager = CollisionManager::new();
        manager.detect(&mut heap, &boundaries);

        assert_eq!(manager.manifolds().len(), 1);
        let manifold = &manager.manifolds()[0];
        assert!((manifold.penetration - 5.0).abs() < 1e-9);
    }

    #[test]
    fn non_overlapping_circles_produce_no_manifold() {
        let mut heap = BodyHeap::new();
        heap.append(circle_body(Vector2::new(0.0, 0.0), 10.0)).unwrap();
        heap.append(circle_body(Vector2::new(100.0, 0.0), 10.0)).unwrap();

        let boundaries = BoundaryManager::new();
        let mut manager = CollisionManager::new();
        manager.detect(&mut heap, &boundaries);

        assert!(manager.manifolds().is_empty());
    }

    #[test]
    fn two_total_static_bodies_never_collide() {
        let mut heap = BodyHeap::new();
        heap.append(crate::body::Body::new(
            BodyConfig {
                pos: Vector2::new(0.0, 0.0),
                shape: Shape::Circle { radius: 10.0 },
                static_kind: StaticKind::Total,
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap())
        .unwrap();
        heap.append(crate::body::Body::new(
            BodyConfig {
                pos: Vector2::new(5.0, 0.0),
                shape: Shape::Circle { radius: 10.0 },
                static_kind: StaticKind::Total,
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap())
        .unwrap();

        let boundaries = BoundaryManager::new();
        let mut manager = CollisionManager::new();
        manager.detect(&mut heap, &boundaries);
        assert!(manager.manifolds().is_empty());
    }
}
