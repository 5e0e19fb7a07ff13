//! Host-facing facade over the six cooperating components.
//!
//! Grounded on the teacher's `physics::Physics` struct as the "owns
//! everything, exposes a small host API" shape, with its hecs `World`
//! replaced by [`crate::heap::BodyHeap`] and its `Settings` replaced by
//! [`WorldConfig`].

use crate::body::{Body, BodyConfig, BodyId, BodyKind};
use crate::boundary::{Boundary, BoundaryManager};
use crate::error::{isolate_callback, ConfigError, DomainError};
use crate::force::ForceManager;
use crate::heap::BodyHeap;
use crate::math::Vector2;
use crate::motion::{Motion, RunState};
use crate::renderer::Renderer;

/// A plain `(x, y)` pair for config fields, kept separate from
/// [`Vector2`] so `WorldConfig` can derive `Deserialize` without needing
/// `vek`'s optional serde feature, matching how the teacher's own
/// `*Settings` structs (`src/object.rs`) stick to bare `f64` fields rather
/// than deserializing its math types directly.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct Vec2Config {
    pub x: f64,
    pub y: f64,
}

impl From<Vec2Config> for Vector2 {
    fn from(v: Vec2Config) -> Self {
        Vector2::new(v.x, v.y)
    }
}

impl From<Vector2> for Vec2Config {
    fn from(v: Vector2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Tunable global parameters, deserializable so a host may load them from
/// a config file instead of constructing them in code.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct WorldConfig {
    pub gravity: Vec2Config,
    pub linear_drag: Vec2Config,
    pub angular_drag: f64,
}

impl WorldConfig {
    pub fn gravity(&self) -> Vector2 {
        self.gravity.into()
    }

    pub fn linear_drag(&self) -> Vector2 {
        self.linear_drag.into()
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2Config { x: 0.0, y: 5.0 },
            linear_drag: Vec2Config { x: 0.2, y: 0.0 },
            angular_drag: 0.15,
        }
    }
}

/// Partial override for [`World::set_global_force`]; unset fields are left
/// unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialForceConfig {
    pub gravity: Option<Vector2>,
    pub linear_drag: Option<Vector2>,
    pub angular_drag: Option<f64>,
}

type StepFn = Box<dyn FnMut(&mut World)>;

/// Owns every body, boundary, and force generator, and drives the
/// simulation one step at a time.
pub struct World {
    width: f64,
    height: f64,
    bodies: BodyHeap,
    boundaries: BoundaryManager,
    forces: ForceManager,
    motion: Motion,
    renderer: Option<Box<dyn Renderer>>,
    step_fns: Vec<StepFn>,
}

impl World {
    pub fn new(viewport: (f64, f64), config: WorldConfig) -> Self {
        let (width, height) = viewport;
        let mut boundaries = BoundaryManager::new();
        boundaries.set_viewport(width, height);

        Self {
            width,
            height,
            bodies: BodyHeap::new(),
            boundaries,
            forces: ForceManager::new(config.gravity(), config.linear_drag(), config.angular_drag),
            motion: Motion::new(),
            renderer: None,
            step_fns: Vec::new(),
        }
    }

    pub fn append_body_config(&mut self, config: BodyConfig, kind: BodyKind) -> Result<BodyId, ConfigError> {
        let body = Body::new(config, kind)?;
        self.append_body(body)
    }

    pub fn append_body(&mut self, body: Body) -> Result<BodyId, ConfigError> {
        self.bodies.append(body)
    }

    pub fn append_boundary(&mut self, boundary: Boundary) {
        // Boundaries are normally derived from the viewport (see `new`);
        // this exists for a host that wants a non-rectangular wall set.
        self.boundaries.push_custom(boundary);
    }

    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        self.bodies.remove(id)
    }

    pub fn get_body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn get_body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub fn pause(&mut self) {
        self.motion.pause();
    }

    pub fn start(&mut self) {
        self.motion.start();
    }

    pub fn is_running(&self) -> bool {
        self.motion.run_state() == RunState::Running
    }

    pub fn set_global_force(&mut self, partial: PartialForceConfig) {
        if let Some(gravity) = partial.gravity {
            self.forces.set_gravity(gravity);
        }
        if let Some(linear_drag) = partial.linear_drag {
            self.forces.set_linear_drag(linear_drag);
        }
        if let Some(angular_drag) = partial.angular_drag {
            self.forces.set_angular_drag(angular_drag);
        }
    }

    pub fn add_world_step_fn(&mut self, f: impl FnMut(&mut World) + 'static) {
        self.step_fns.push(Box::new(f));
    }

    pub fn set_error_handler(&mut self, f: impl FnMut(DomainError) + 'static) {
        self.motion.set_error_handler(f);
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn step_count(&self) -> u64 {
        self.motion.step_count()
    }

    /// Advance the simulation by one tick, if running.
    pub fn step(&mut self) {
        if self.motion.run_state() != RunState::Running {
            return;
        }

        self.motion.step(&mut self.bodies, &self.boundaries, &self.forces);
        self.run_step_fns();

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.tick();
        }
    }

    fn run_step_fns(&mut self) {
        puffin::profile_scope!("world_step_fns");

        let mut step_fns = std::mem::take(&mut self.step_fns);
        for step_fn in &mut step_fns {
            isolate_callback(std::panic::AssertUnwindSafe(|| step_fn(self)));
        }
        self.step_fns = step_fns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyConfig, BodyKind, Material, Shape, StaticKind};

    fn drop_circle(world: &mut World, pos: Vector2, material: Material) -> BodyId {
        world
            .append_body_config(
                BodyConfig {
                    pos,
                    shape: Shape::Circle { radius: 10.0 },
                    material,
                    mass: Some(1.0),
                    ..Default::default()
                },
                BodyKind::Circle,
            )
            .unwrap()
    }

    #[test]
    fn free_fall_matches_semi_implicit_euler() {
        let mut world = World::new(
            (800.0, 600.0),
            WorldConfig {
                gravity: Vec2Config { x: 0.0, y: 5.0 },
                linear_drag: Vec2Config { x: 0.0, y: 0.0 },
                angular_drag: 0.0,
            },
        );
        let id = drop_circle(&mut world, Vector2::new(400.0, 0.0), Material::default());
        world.start();

        for _ in 0..10 {
            world.step();
        }

        let expected: f64 = (1..=10).map(|k| 5.0 * k as f64).sum();
        let actual = world.get_body(id).unwrap().pos().y;
        assert!((actual - expected).abs() < 1e-6);
    }

    #[test]
    fn paused_world_does_not_advance() {
        let mut world = World::new((800.0, 600.0), WorldConfig::default());
        let id = drop_circle(&mut world, Vector2::new(400.0, 0.0), Material::default());
        world.step();
        assert_eq!(world.get_body(id).unwrap().pos().y, 0.0);
    }

    #[test]
    fn total_static_body_ignores_boundary_and_gravity() {
        let mut world = World::new((800.0, 600.0), WorldConfig::default());
        let id = world
            .append_body_config(
                BodyConfig {
                    pos: Vector2::new(400.0, 590.0),
                    shape: Shape::Circle { radius: 10.0 },
                    static_kind: StaticKind::Total,
                    ..Default::default()
                },
                BodyKind::Circle,
            )
            .unwrap();
        world.start();
        for _ in 0..60 {
            world.step();
        }
        assert_eq!(world.get_body(id).unwrap().pos(), Vector2::new(400.0, 590.0));
    }

    #[test]
    fn body_count_tracks_append_and_remove() {
        let mut world = World::new((800.0, 600.0), WorldConfig::default());
        assert_eq!(world.body_count(), 0);
        let id = drop_circle(&mut world, Vector2::zero(), Material::default());
        assert_eq!(world.body_count(), 1);
        world.remove_body(id);
        assert_eq!(world.body_count(), 0);
    }
}
