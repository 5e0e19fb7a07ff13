//! Sequential-impulse contact resolution.
//!
//! Grounded on `physics::constraint::penetration::PenetrationConstraint`'s
//! `solve_velocities` for the restitution/friction split, but replaces its
//! XPBD lambda-accumulation scheme with the direct impulse formula read
//! from the rhusics `resolve_contact` function (`other_examples/`,
//! retrieved during this crate's research phase but no longer present on
//! disk — see DESIGN.md): positional correction, a single normal impulse
//! `j` per contact point, and a Coulomb-clamped tangential impulse `jT`.

use std::collections::HashSet;

use crate::body::{Body, BodyId, StaticKind};
use crate::collision::{ContactSide, Manifold};
use crate::error::isolate_callback;
use crate::heap::BodyHeap;
use crate::math::Vector2;

const POSITIONAL_CORRECTION_PERCENT: f64 = 0.8;

/// Resolves manifolds into impulses and tracks collided/separated
/// transitions across steps.
#[derive(Default)]
pub struct ContactResolver {
    previous_pairs: HashSet<(BodyId, BodyId)>,
}

impl ContactResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every manifold produced this step against `heap`.
    pub fn resolve(&mut self, heap: &mut BodyHeap, manifolds: &[Manifold]) {
        puffin::profile_function!();

        let mut current_pairs = HashSet::new();

        for manifold in manifolds {
            match (manifold.a, manifold.b) {
                (ContactSide::Body(a_id), ContactSide::Body(b_id)) => {
                    current_pairs.insert(ordered_pair(a_id, b_id));
                    resolve_body_pair(heap, a_id, b_id, manifold);
                }
                (ContactSide::Body(body_id), ContactSide::Boundary(_))
                | (ContactSide::Boundary(_), ContactSide::Body(body_id)) => {
                    resolve_against_boundary(heap, body_id, manifold);
                }
                (ContactSide::Boundary(_), ContactSide::Boundary(_)) => {}
            }
        }

        self.emit_transitions(heap, &current_pairs);
        self.previous_pairs = current_pairs;
    }

    fn emit_transitions(&self, heap: &mut BodyHeap, current: &HashSet<(BodyId, BodyId)>) {
        for &(a_id, b_id) in current {
            if !self.previous_pairs.contains(&(a_id, b_id)) {
                fire_collided(heap, a_id, b_id);
                fire_collided(heap, b_id, a_id);
            }
        }
        for &(a_id, b_id) in &self.previous_pairs {
            if !current.contains(&(a_id, b_id)) {
                fire_separated(heap, a_id);
                fire_separated(heap, b_id);
            }
        }
    }
}

fn ordered_pair(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    use slotmap::Key;
    if a.data().as_ffi() <= b.data().as_ffi() {
        (a, b)
    } else {
        (b, a)
    }
}

fn fire_collided(heap: &mut BodyHeap, target: BodyId, other: BodyId) {
    let Some(body) = heap.get_mut(target) else {
        return;
    };
    if let Some(callback) = body.collided.as_mut() {
        isolate_callback(std::panic::AssertUnwindSafe(|| callback(other)));
    }
}

fn fire_separated(heap: &mut BodyHeap, target: BodyId) {
    let Some(body) = heap.get_mut(target) else {
        return;
    };
    if let Some(callback) = body.separated.as_mut() {
        isolate_callback(std::panic::AssertUnwindSafe(|| callback()));
    }
}

fn resolve_body_pair(heap: &mut BodyHeap, a_id: BodyId, b_id: BodyId, manifold: &Manifold) {
    let point_count = manifold.points.len().max(1) as f64;

    positional_correction(heap, a_id, b_id, manifold.normal, manifold.penetration);

    for &point in &manifold.points {
        let Some([a, b]) = get_two_mut(heap, a_id, b_id) else {
            continue;
        };
        apply_point_impulse(a, b, manifold.normal, point, point_count);
    }
}

fn resolve_against_boundary(heap: &mut BodyHeap, body_id: BodyId, manifold: &Manifold) {
    let point_count = manifold.points.len().max(1) as f64;

    if let Some(body) = heap.get_mut(body_id) {
        if body.static_kind() != StaticKind::Total {
            body.set_pos(body.pos() + manifold.normal * manifold.penetration);
        }
    }

    for &point in &manifold.points {
        let Some(body) = heap.get_mut(body_id) else {
            continue;
        };
        apply_point_impulse_against_static(body, manifold.normal, point, point_count);
    }
}

fn get_two_mut(heap: &mut BodyHeap, a_id: BodyId, b_id: BodyId) -> Option<[&mut Body; 2]> {
    if a_id == b_id {
        return None;
    }
    // SAFETY-free approach: fetch raw pointers after confirming distinctness,
    // matching the teacher's `get_many_mut` usage pattern in
    // `PenetrationConstraint::solve` without requiring hashbrown's API.
    let a_ptr: *mut Body = heap.get_mut(a_id)?;
    let b_ptr: *mut Body = heap.get_mut(b_id)?;
    // Safe because `a_id != b_id` guarantees the slotmap returned two
    // distinct, non-aliasing slots.
    unsafe { Some([&mut *a_ptr, &mut *b_ptr]) }
}

fn positional_correction(heap: &mut BodyHeap, a_id: BodyId, b_id: BodyId, normal: Vector2, penetration: f64) {
    let Some([a, b]) = get_two_mut(heap, a_id, b_id) else {
        return;
    };
    let total_inverse_mass = a.inverse_mass + b.inverse_mass;
    if total_inverse_mass <= f64::EPSILON {
        return;
    }
    let correction = normal * (penetration * POSITIONAL_CORRECTION_PERCENT / total_inverse_mass);
    if a.inverse_mass > 0.0 {
        let new_pos = a.pos() - correction * a.inverse_mass;
        a.set_pos(new_pos);
    }
    if b.inverse_mass > 0.0 {
        let new_pos = b.pos() + correction * b.inverse_mass;
        b.set_pos(new_pos);
    }
}

fn angular_term(body: &Body, r: Vector2, normal: Vector2) -> f64 {
    if body.inverse_inertia <= 0.0 {
        return 0.0;
    }
    let rn = cross(r, normal);
    rn * rn * body.inverse_inertia
}

fn cross(a: Vector2, b: Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

fn cross_scalar(omega: f64, r: Vector2) -> Vector2 {
    Vector2::new(-omega * r.y, omega * r.x)
}

fn velocity_at_point(body: &Body, r: Vector2) -> Vector2 {
    body.linear_velocity() + cross_scalar(body.angular_velocity(), r)
}

fn apply_point_impulse(a: &mut Body, b: &mut Body, normal: Vector2, point: Vector2, point_count: f64) {
    let r_a = point - (a.pos() + a.centroid);
    let r_b = point - (b.pos() + b.centroid);

    let relative_velocity = velocity_at_point(b, r_b) - velocity_at_point(a, r_a);
    let normal_velocity = relative_velocity.dot(normal);
    if normal_velocity > 0.0 {
        return;
    }

    let restitution = a.material().restitution.min(b.material().restitution);
    let k = a.inverse_mass + b.inverse_mass + angular_term(a, r_a, normal) + angular_term(b, r_b, normal);
    if k <= f64::EPSILON {
        return;
    }

    let j = -(1.0 + restitution) * normal_velocity / k / point_count;
    let impulse = normal * j;

    apply_impulse(a, -impulse, r_a);
    apply_impulse(b, impulse, r_b);

    let friction = (a.material().friction * b.material().friction).sqrt();
    let relative_velocity = velocity_at_point(b, r_b) - velocity_at_point(a, r_a);
    let tangent_velocity = relative_velocity - normal * relative_velocity.dot(normal);
    let tangent_speed = tangent_velocity.magnitude();
    if tangent_speed <= f64::EPSILON {
        return;
    }
    let tangent = tangent_velocity / tangent_speed;
    let k_t = a.inverse_mass + b.inverse_mass + angular_term(a, r_a, tangent) + angular_term(b, r_b, tangent);
    if k_t <= f64::EPSILON {
        return;
    }
    let jt = (-relative_velocity.dot(tangent) / k_t / point_count).clamp(-friction * j.abs(), friction * j.abs());
    let friction_impulse = tangent * jt;
    apply_impulse(a, -friction_impulse, r_a);
    apply_impulse(b, friction_impulse, r_b);
}

fn apply_point_impulse_against_static(body: &mut Body, normal: Vector2, point: Vector2, point_count: f64) {
    if body.static_kind() == StaticKind::Total {
        return;
    }
    let r = point - (body.pos() + body.centroid);
    let velocity = velocity_at_point(body, r);
    let normal_velocity = velocity.dot(normal);
    if normal_velocity > 0.0 {
        return;
    }

    let k = body.inverse_mass + angular_term(body, r, normal);
    if k <= f64::EPSILON {
        return;
    }

    let j = -(1.0 + body.material().restitution) * normal_velocity / k / point_count;
    apply_impulse(body, normal * j, r);

    let velocity = velocity_at_point(body, r);
    let tangent_velocity = velocity - normal * velocity.dot(normal);
    let tangent_speed = tangent_velocity.magnitude();
    if tangent_speed <= f64::EPSILON {
        return;
    }
    let tangent = tangent_velocity / tangent_speed;
    let k_t = body.inverse_mass + angular_term(body, r, tangent);
    if k_t <= f64::EPSILON {
        return;
    }
    let jt = (-velocity.dot(tangent) / k_t)
        .clamp(-body.material().friction * j.abs(), body.material().friction * j.abs());
    apply_impulse(body, tangent * jt, r);
}

fn apply_impulse(body: &mut Body, impulse: Vector2, r: Vector2) {
    if body.static_kind() == StaticKind::Total {
        return;
    }
    let new_v = body.linear_velocity() + impulse * body.inverse_mass;
    body.set_linear_velocity(new_v);
    if body.static_kind() != StaticKind::Total {
        let new_omega = body.angular_velocity() + cross(r, impulse) * body.inverse_inertia;
        body.set_angular_velocity(new_omega);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyConfig, BodyKind, Shape};
    use crate::collision::CollisionManager;

    #[test]
    fn head_on_elastic_collision_swaps_velocities() {
        let mut heap = BodyHeap::new();
        let a = heap
            .append(
                Body::new(
                    BodyConfig {
                        pos: Vector2::new(100.0, 300.0),
                        shape: Shape::Circle { radius: 10.0 },
                        linear_velocity: Vector2::new(5.0, 0.0),
                        material: crate::body::Material {
                            restitution: 1.0,
                            friction: 0.0,
                            ..Default::default()
                        },
                        mass: Some(1.0),
                        ..Default::default()
                    },
                    BodyKind::Circle,
                )
                .unwrap(),
            )
            .unwrap();
        let b = heap
            .append(
                Body::new(
                    BodyConfig {
                        pos: Vector2::new(119.0, 300.0),
                        shape: Shape::Circle { radius: 10.0 },
                        linear_velocity: Vector2::new(-5.0, 0.0),
                        material: crate::body::Material {
                            restitution: 1.0,
                            friction: 0.0,
                            ..Default::default()
                        },
                        mass: Some(1.0),
                        ..Default::default()
                    },
                    BodyKind::Circle,
                )
                .unwrap(),
            )
            .unwrap();

        let boundaries = crate::boundary::BoundaryManager::new();
        let mut collisions = CollisionManager::new();
        collisions.detect(&mut heap, &boundaries);
        assert_eq!(collisions.manifolds().len(), 1);

        let mut resolver = ContactResolver::new();
        resolver.resolve(&mut heap, collisions.manifolds());

        let va = heap.get(a).unwrap().linear_velocity();
        let vb = heap.get(b).unwrap().linear_velocity();
        assert!((va.x - -5.0).abs() < 1e-6);
        assert!((vb.x - 5.0).abs() < 1e-6);
    }

    #[test]
    fn callback_fires_once_per_transition() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let collided_count = Arc::new(AtomicUsize::new(0));
        let separated_count = Arc::new(AtomicUsize::new(0));

        let mut heap = BodyHeap::new();
        let mut a = Body::new(
            BodyConfig {
                pos: Vector2::new(0.0, 0.0),
                shape: Shape::Circle { radius: 10.0 },
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap();
        let counter = Arc::clone(&collided_count);
        a.collided = Some(Box::new(move |_other| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let sep_counter = Arc::clone(&separated_count);
        a.separated = Some(Box::new(move || {
            sep_counter.fetch_add(1, Ordering::SeqCst);
        }));
        let a_id = heap.append(a).unwrap();

        let b = Body::new(
            BodyConfig {
                pos: Vector2::new(15.0, 0.0),
                shape: Shape::Circle { radius: 10.0 },
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap();
        heap.append(b).unwrap();

        let boundaries = crate::boundary::BoundaryManager::new();
        let mut collisions = CollisionManager::new();
        let mut resolver = ContactResolver::new();

        collisions.detect(&mut heap, &boundaries);
        resolver.resolve(&mut heap, collisions.manifolds());
        collisions.detect(&mut heap, &boundaries);
        resolver.resolve(&mut heap, collisions.manifolds());
        assert_eq!(collided_count.load(Ordering::SeqCst), 1);

        heap.get_mut(a_id).unwrap().set_pos(Vector2::new(-100.0, 0.0));
        collisions.detect(&mut heap, &boundaries);
        resolver.resolve(&mut heap, collisions.manifolds());
        assert_eq!(separated_count.load(Ordering::SeqCst), 1);
    }
}
