//! Global force generators applied to every active body each step.
//!
//! Grounded on the teacher's hecs `Settings { gravity, air_friction,
//! rotation_friction }` in `physics/mod.rs`; generalized into a small
//! registry of generator variants so `World::set_global_force` can mutate
//! gravity/drag in place without touching generator identity or order.

use crate::body::{Body, BodyState, StaticKind};
use crate::math::Vector2;

/// A single global force contribution.
#[derive(Debug, Clone, Copy)]
pub enum ForceGenerator {
    Gravity { acceleration: Vector2 },
    LinearDrag { coefficient: Vector2 },
    AngularDrag { coefficient: f64 },
}

/// Registry of global force generators, applied to every non-static,
/// non-sleeping body each step.
#[derive(Debug, Clone)]
pub struct ForceManager {
    linear: Vec<ForceGenerator>,
    angular: Vec<ForceGenerator>,
}

impl ForceManager {
    /// Construct the manager with the three generators every `World` starts
    /// with (gravity, linear drag, angular drag), matching the teacher's
    /// `Settings` defaults.
    pub fn new(gravity: Vector2, linear_drag: Vector2, angular_drag: f64) -> Self {
        Self {
            linear: vec![
                ForceGenerator::Gravity {
                    acceleration: gravity,
                },
                ForceGenerator::LinearDrag {
                    coefficient: linear_drag,
                },
            ],
            angular: vec![ForceGenerator::AngularDrag {
                coefficient: angular_drag,
            }],
        }
    }

    pub fn set_gravity(&mut self, gravity: Vector2) {
        for generator in &mut self.linear {
            if let ForceGenerator::Gravity { acceleration } = generator {
                *acceleration = gravity;
            }
        }
    }

    pub fn set_linear_drag(&mut self, drag: Vector2) {
        for generator in &mut self.linear {
            if let ForceGenerator::LinearDrag { coefficient } = generator {
                *coefficient = drag;
            }
        }
    }

    pub fn set_angular_drag(&mut self, drag: f64) {
        for generator in &mut self.angular {
            if let ForceGenerator::AngularDrag { coefficient } = generator {
                *coefficient = drag;
            }
        }
    }

    /// Accumulate every registered linear generator's contribution into
    /// `body`'s linear force accumulator.
    pub fn apply_linear_force(&self, body: &mut Body) {
        if body.state() != BodyState::Simulate || body.static_kind() == StaticKind::Total {
            return;
        }
        let v = body.linear_velocity();
        for generator in &self.linear {
            let accel = match generator {
                ForceGenerator::Gravity { acceleration } => *acceleration,
                ForceGenerator::LinearDrag { coefficient } => {
                    Vector2::new(-coefficient.x * v.x, -coefficient.y * v.y)
                }
                ForceGenerator::AngularDrag { .. } => continue,
            };
            body.apply_linear_force(accel);
        }
    }

    /// Accumulate every registered angular generator's contribution into
    /// `body`'s angular force accumulator.
    pub fn apply_angular_force(&self, body: &mut Body) {
        if body.state() != BodyState::Simulate || body.static_kind() == StaticKind::Total {
            return;
        }
        let omega = body.angular_velocity();
        for generator in &self.angular {
            let accel = match generator {
                ForceGenerator::AngularDrag { coefficient } => -coefficient * omega,
                _ => continue,
            };
            body.apply_angular_force(accel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyConfig, BodyKind, Shape};

    #[test]
    fn gravity_accumulates_into_linear_acc() {
        let manager = ForceManager::new(Vector2::new(0.0, 5.0), Vector2::zero(), 0.0);
        let mut body = Body::new(
            BodyConfig {
                shape: Shape::Circle { radius: 1.0 },
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap();
        manager.apply_linear_force(&mut body);
        body.integrate();
        assert_eq!(body.linear_velocity(), Vector2::new(0.0, 5.0));
    }

    #[test]
    fn set_gravity_mutates_in_place() {
        let mut manager = ForceManager::new(Vector2::new(0.0, 5.0), Vector2::zero(), 0.0);
        manager.set_gravity(Vector2::new(0.0, 9.8));
        let mut body = Body::new(
            BodyConfig {
                shape: Shape::Circle { radius: 1.0 },
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap();
        manager.apply_linear_force(&mut body);
        body.integrate();
        assert_eq!(body.linear_velocity(), Vector2::new(0.0, 9.8));
    }
}
