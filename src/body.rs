//! Rigid body representation and per-body integration.
//!
//! Grounded on the teacher's `physics::rigidbody::RigidBody` (flat struct,
//! `integrate`/`solve` split, `inv_mass == 0.0` as the static marker) but
//! generalized from a single `Rectangle` shape to the `{Circle, Polygon}`
//! dispatch the geometry actually needs, with `Triangle`/`Rectangle` kept as
//! construction-time vocabulary over the `Polygon` variant.

use std::collections::VecDeque;

use slotmap::new_key_type;

use crate::error::ConfigError;
use crate::math::{BoundRect, Rotation, Vector2};
use crate::renderer::{ProxyAttr, VisualProxy};

new_key_type! {
    /// Stable handle into a [`crate::heap::BodyHeap`].
    pub struct BodyId;
}

/// Construction-time shape vocabulary exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Circle,
    Polygon,
    Triangle,
    Rect,
}

/// Dispatch-time geometry. Triangle and Rectangle both collapse to `Polygon`
/// since every narrow-phase and mass-property calculation only needs an
/// arbitrary convex vertex list.
#[derive(Debug, Clone)]
pub enum Shape {
    Circle { radius: f64 },
    Polygon { local_vertices: Vec<Vector2> },
}

/// How much a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaticKind {
    #[default]
    None,
    Position,
    Total,
}

impl StaticKind {
    /// Parse a host-supplied tag, defaulting to `None` on anything else
    /// rather than rejecting the whole body for a typo.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "position" => Self::Position,
            "total" => Self::Total,
            _ => Self::None,
        }
    }
}

/// Lifecycle state of a body within the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    Init,
    Simulate,
    Sleep,
}

const SLEEP_RING_CAPACITY: usize = 20;
const SLEEP_STD_DEV_THRESHOLD: f64 = 500.0;

/// Fixed-capacity ring buffer of recent motion samples, used to decide when
/// a body is settled enough to stop integrating.
#[derive(Debug, Clone, Default)]
pub struct SleepRing {
    samples: VecDeque<f64>,
}

impl SleepRing {
    fn push(&mut self, sample: f64) {
        if self.samples.len() == SLEEP_RING_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    fn is_settled(&self) -> bool {
        if self.samples.len() < SLEEP_RING_CAPACITY {
            return false;
        }
        let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        let variance = self
            .samples
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / self.samples.len() as f64;
        variance.sqrt() < SLEEP_STD_DEV_THRESHOLD
    }

    fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Material properties shared by every shape variant.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub density: f64,
    pub friction: f64,
    pub restitution: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 0.01,
            friction: 0.3,
            restitution: 0.9,
        }
    }
}

/// Host-facing construction parameters for a new body.
pub struct BodyConfig {
    pub pos: Vector2,
    pub rotation_degrees: f64,
    pub shape: Shape,
    pub mass: Option<f64>,
    pub static_kind: StaticKind,
    pub linear_velocity: Vector2,
    pub angular_velocity: f64,
    pub material: Material,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            pos: Vector2::zero(),
            rotation_degrees: 0.0,
            shape: Shape::Circle { radius: 1.0 },
            mass: None,
            static_kind: StaticKind::None,
            linear_velocity: Vector2::zero(),
            angular_velocity: 0.0,
            material: Material::default(),
        }
    }
}

type CollisionCallback = Box<dyn FnMut(BodyId)>;
type SeparationCallback = Box<dyn FnMut()>;

/// A single rigid body.
pub struct Body {
    pub(crate) kind: BodyKind,
    pub(crate) shape: Shape,
    pub(crate) pos: Vector2,
    pub(crate) rot: Rotation,
    pub(crate) v: Vector2,
    pub(crate) omega: f64,
    pub(crate) linear_acc: Vector2,
    pub(crate) angular_acc: f64,
    pub(crate) mass: f64,
    pub(crate) inverse_mass: f64,
    pub(crate) material: Material,
    pub(crate) area: f64,
    pub(crate) centroid: Vector2,
    pub(crate) rotation_inertia: f64,
    pub(crate) inverse_inertia: f64,
    pub(crate) static_kind: StaticKind,
    pub(crate) state: BodyState,
    pub(crate) bound_rect: BoundRect,
    pub(crate) sleep_ring: SleepRing,
    pub(crate) world_vertices: Vec<Vector2>,
    pub collided: Option<CollisionCallback>,
    pub separated: Option<SeparationCallback>,
    visual_proxy: Option<Box<dyn VisualProxy>>,
}

impl Body {
    /// Construct a new body from host-facing configuration, computing mass
    /// properties and the initial bounding rectangle.
    pub fn new(config: BodyConfig, kind: BodyKind) -> Result<Self, ConfigError> {
        let area = Self::calc_area(&config.shape)?;

        let density = match config.mass {
            Some(mass) if config.static_kind == StaticKind::None => {
                if mass <= 0.0 {
                    return Err(ConfigError::InvalidMass { mass });
                }
                mass / area
            }
            _ => config.material.density,
        };

        let mass = area * density;
        let centroid = Self::calc_centroid(&config.shape);
        let rotation_inertia = Self::calc_rotation_inertia(&config.shape, mass, centroid);

        let (inverse_mass, inverse_inertia) = match config.static_kind {
            StaticKind::None => (1.0 / mass, 1.0 / rotation_inertia.max(f64::MIN_POSITIVE)),
            StaticKind::Position => (0.0, 1.0 / rotation_inertia.max(f64::MIN_POSITIVE)),
            StaticKind::Total => (0.0, 0.0),
        };

        let rot = Rotation::from_degrees(config.rotation_degrees);

        let mut body = Self {
            kind,
            shape: config.shape,
            pos: config.pos,
            rot,
            v: config.linear_velocity,
            omega: config.angular_velocity,
            linear_acc: Vector2::zero(),
            angular_acc: 0.0,
            mass,
            inverse_mass,
            material: config.material,
            area,
            centroid,
            rotation_inertia,
            inverse_inertia,
            static_kind: config.static_kind,
            state: BodyState::Init,
            bound_rect: BoundRect::new_empty(Vector2::zero()),
            sleep_ring: SleepRing::default(),
            world_vertices: Vec::new(),
            collided: None,
            separated: None,
            visual_proxy: None,
        };

        body.init_body_data();
        body.state = BodyState::Simulate;

        Ok(body)
    }

    fn calc_area(shape: &Shape) -> Result<f64, ConfigError> {
        match shape {
            Shape::Circle { radius } => {
                if *radius <= 0.0 {
                    return Err(ConfigError::InvalidRadius { radius: *radius });
                }
                Ok(std::f64::consts::PI * radius * radius)
            }
            Shape::Polygon { local_vertices } => {
                if local_vertices.len() < 3 {
                    return Err(ConfigError::TooFewVertices {
                        count: local_vertices.len(),
                    });
                }
                let area = signed_area(local_vertices).abs();
                if area <= 0.0 {
                    return Err(ConfigError::DegenerateArea { area });
                }
                Ok(area)
            }
        }
    }

    fn calc_centroid(shape: &Shape) -> Vector2 {
        match shape {
            Shape::Circle { .. } => Vector2::zero(),
            Shape::Polygon { local_vertices } => polygon_centroid(local_vertices),
        }
    }

    fn calc_rotation_inertia(shape: &Shape, mass: f64, centroid: Vector2) -> f64 {
        match shape {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Polygon { local_vertices } => {
                polygon_rotation_inertia(local_vertices, mass, centroid)
            }
        }
    }

    /// Compute initial world-space vertices (if polygonal) and bounding rect.
    pub fn init_body_data(&mut self) {
        self.refresh_world_vertices();
        self.bound_rect = self.create_bound_rect();
    }

    fn refresh_world_vertices(&mut self) {
        if let Shape::Polygon { local_vertices } = &self.shape {
            self.world_vertices = local_vertices
                .iter()
                .map(|v| self.pos + self.rot.rotate(*v))
                .collect();
        }
    }

    /// Vertices (polygon) or center (circle) in world space for the narrow
    /// phase and the renderer.
    pub fn world_vertices(&self) -> &[Vector2] {
        &self.world_vertices
    }

    fn create_bound_rect(&self) -> BoundRect {
        match &self.shape {
            Shape::Circle { radius } => BoundRect {
                min: self.pos - Vector2::new(*radius, *radius),
                max: self.pos + Vector2::new(*radius, *radius),
            },
            Shape::Polygon { .. } => bound_rect_of(&self.world_vertices),
        }
    }

    /// Incrementally update the bounding rect after a position delta; cheap
    /// translation for every shape.
    fn translate_bound_rect(&mut self, delta: Vector2) {
        self.bound_rect.min += delta;
        self.bound_rect.max += delta;
    }

    pub fn bound_rect(&self) -> BoundRect {
        self.bound_rect
    }

    pub fn pos(&self) -> Vector2 {
        self.pos
    }

    pub fn rotation(&self) -> Rotation {
        self.rot
    }

    pub fn linear_velocity(&self) -> Vector2 {
        self.v
    }

    pub fn angular_velocity(&self) -> f64 {
        self.omega
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn state(&self) -> BodyState {
        self.state
    }

    pub fn static_kind(&self) -> StaticKind {
        self.static_kind
    }

    pub fn is_awake(&self) -> bool {
        self.state != BodyState::Sleep
    }

    pub fn material(&self) -> Material {
        self.material
    }

    /// Install the host's visual handle; the core pushes position/rotation
    /// updates into it from here on.
    pub fn set_visual_proxy(&mut self, proxy: Box<dyn VisualProxy>) {
        self.visual_proxy = Some(proxy);
    }

    /// Directly set position, bypassing integration. Wakes a sleeping body.
    pub fn set_pos(&mut self, pos: Vector2) {
        let delta = pos - self.pos;
        self.pos = pos;
        self.translate_bound_rect(delta);
        self.refresh_world_vertices();
        if let Some(proxy) = self.visual_proxy.as_mut() {
            proxy.set_attr(ProxyAttr::X, pos.x);
            proxy.set_attr(ProxyAttr::Y, pos.y);
        }
        self.wake();
    }

    /// Directly set rotation in degrees, bypassing integration.
    pub fn set_rotation_degrees(&mut self, degrees: f64) {
        self.rot = Rotation::from_degrees(degrees);
        self.refresh_world_vertices();
        self.bound_rect = self.create_bound_rect();
        if let Some(proxy) = self.visual_proxy.as_mut() {
            proxy.set_attr(ProxyAttr::Rotate, self.rot.to_degrees());
        }
        self.wake();
    }

    /// Directly set linear velocity. No-op on a totally static body.
    pub fn set_linear_velocity(&mut self, v: Vector2) {
        if self.static_kind == StaticKind::Total {
            return;
        }
        self.v = v;
        self.wake();
    }

    /// Directly set angular velocity. No-op on a totally static body.
    pub fn set_angular_velocity(&mut self, omega: f64) {
        if self.static_kind == StaticKind::Total {
            return;
        }
        self.omega = omega;
        self.wake();
    }

    pub(crate) fn wake(&mut self) {
        if self.state == BodyState::Sleep {
            self.state = BodyState::Simulate;
            self.sleep_ring.clear();
        }
    }

    pub(crate) fn apply_linear_force(&mut self, accel: Vector2) {
        self.linear_acc += accel;
    }

    pub(crate) fn apply_angular_force(&mut self, accel: f64) {
        self.angular_acc += accel;
    }

    /// Integrate position and rotation for one step using semi-implicit
    /// Euler, then clear the force accumulators.
    pub(crate) fn integrate(&mut self) {
        if self.state != BodyState::Simulate {
            return;
        }

        let rotated = self.static_kind != StaticKind::Total;
        if rotated {
            self.omega += self.angular_acc;
            self.rot.add_degrees(self.omega);
        }

        let translated = self.static_kind == StaticKind::None;
        if translated {
            self.v += self.linear_acc;
            let delta = self.v;
            self.pos += delta;
            self.translate_bound_rect(delta);
        }

        self.refresh_world_vertices();
        if !translated {
            // rotation-only update still needs a full rebuild since the
            // translation shortcut above didn't run.
            self.bound_rect = self.create_bound_rect();
        }

        if let Some(proxy) = self.visual_proxy.as_mut() {
            if translated {
                proxy.set_attr(ProxyAttr::X, self.pos.x);
                proxy.set_attr(ProxyAttr::Y, self.pos.y);
            }
            if rotated {
                proxy.set_attr(ProxyAttr::Rotate, self.rot.to_degrees());
            }
        }

        self.linear_acc = Vector2::zero();
        self.angular_acc = 0.0;
    }

    /// Push the current motion sample into the sleep ring and transition to
    /// `Sleep` once settled. No-op for bodies already asleep or fully static.
    pub(crate) fn update_sleep_state(&mut self) {
        if self.state != BodyState::Simulate || self.static_kind == StaticKind::Total {
            return;
        }
        let motion = self.v.magnitude_squared() + self.omega * self.omega;
        self.sleep_ring.push(motion);
        if self.sleep_ring.is_settled() {
            self.state = BodyState::Sleep;
            self.v = Vector2::zero();
            self.omega = 0.0;
        }
    }

    pub(crate) fn mark_asleep_on_error(&mut self) {
        self.state = BodyState::Sleep;
        self.v = Vector2::zero();
        self.omega = 0.0;
    }

    pub(crate) fn has_finite_state(&self) -> bool {
        self.pos.x.is_finite()
            && self.pos.y.is_finite()
            && self.v.x.is_finite()
            && self.v.y.is_finite()
            && self.omega.is_finite()
    }
}

fn signed_area(vertices: &[Vector2]) -> f64 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

fn polygon_centroid(vertices: &[Vector2]) -> Vector2 {
    let n = vertices.len();
    let area = signed_area(vertices);
    if area.abs() < f64::EPSILON {
        return vertices.iter().fold(Vector2::zero(), |acc, v| acc + *v) / n as f64;
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    let factor = 1.0 / (6.0 * area);
    Vector2::new(cx * factor, cy * factor)
}

fn polygon_rotation_inertia(vertices: &[Vector2], mass: f64, centroid: Vector2) -> f64 {
    let n = vertices.len();
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for i in 0..n {
        let a = vertices[i] - centroid;
        let b = vertices[(i + 1) % n] - centroid;
        let cross = (a.x * b.y - b.x * a.y).abs();
        numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
        denominator += cross;
    }
    if denominator <= f64::EPSILON {
        return mass;
    }
    mass / 6.0 * (numerator / denominator)
}

fn bound_rect_of(vertices: &[Vector2]) -> BoundRect {
    let mut min = vertices[0];
    let mut max = vertices[0];
    for v in vertices.iter().skip(1) {
        min.x = min.x.min(v.x);
        min.y = min.y.min(v.y);
        max.x = max.x.max(v.x);
        max.y = max.y.max(v.y);
    }
    BoundRect { min, max }
}

/// Build the local (centered) vertex list for a rectangle of the given size.
pub fn rectangle_vertices(width: f64, height: f64) -> Vec<Vector2> {
    let hw = width * 0.5;
    let hh = height * 0.5;
    vec![
        Vector2::new(-hw, -hh),
        Vector2::new(hw, -hh),
        Vector2::new(hw, hh),
        Vector2::new(-hw, hh),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(pos: Vector2, static_kind: StaticKind) -> Body {
        Body::new(
            BodyConfig {
                pos,
                shape: Shape::Circle { radius: 10.0 },
                static_kind,
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap()
    }

    #[test]
    fn static_total_body_never_moves() {
        let mut body = circle(Vector2::new(0.0, 0.0), StaticKind::Total);
        body.apply_linear_force(Vector2::new(0.0, 5.0));
        body.integrate();
        assert_eq!(body.pos(), Vector2::new(0.0, 0.0));
        assert_eq!(body.linear_velocity(), Vector2::zero());
    }

    #[test]
    fn inverse_mass_matches_static_kind() {
        let dynamic = circle(Vector2::zero(), StaticKind::None);
        assert!(dynamic.inverse_mass > 0.0);

        let total = circle(Vector2::zero(), StaticKind::Total);
        assert_eq!(total.inverse_mass, 0.0);
    }

    #[test]
    fn set_pos_wakes_sleeping_body() {
        let mut body = circle(Vector2::zero(), StaticKind::None);
        body.state = BodyState::Sleep;
        body.set_pos(Vector2::new(5.0, 5.0));
        assert_eq!(body.state(), BodyState::Simulate);
    }

    #[test]
    fn bound_rect_encloses_circle() {
        let body = circle(Vector2::new(3.0, 4.0), StaticKind::None);
        let rect = body.bound_rect();
        assert!(rect.min.x <= -7.0 + 3.0 + 1e-9);
        assert!(rect.max.x >= 13.0 - 1e-9);
    }

    #[test]
    fn unknown_static_tag_defaults_to_none() {
        assert_eq!(StaticKind::from_tag("bogus"), StaticKind::None);
        assert_eq!(StaticKind::from_tag("total"), StaticKind::Total);
    }
}
