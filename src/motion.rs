//! The engine's own run/pause state machine and per-step orchestration.
//!
//! Grounded on the teacher's `Physics::step(dt)` substep loop in
//! `physics/mod.rs` (integrate → narrow-phase → resolve → ...), flattened
//! to one pass per stage since this crate's contract is unit-time steps
//! rather than dt-based substeps (see SPEC_FULL.md §5 Open Question).

use crate::body::BodyState;
use crate::boundary::BoundaryManager;
use crate::collision::CollisionManager;
use crate::error::DomainError;
use crate::force::ForceManager;
use crate::heap::BodyHeap;
use crate::resolve::ContactResolver;

/// Whether the engine is advancing the simulation on each host tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

type ErrorHandler = Box<dyn FnMut(DomainError)>;

/// Drives one simulation step: force application, integration, collision
/// detection, resolution, sleep heuristic. User step functions and the
/// renderer tick are the caller's (`World`'s) responsibility, since they
/// need access to the whole `World`, not just this driver.
pub struct Motion {
    run_state: RunState,
    step_count: u64,
    collisions: CollisionManager,
    resolver: ContactResolver,
    error_handler: Option<ErrorHandler>,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            run_state: RunState::Stopped,
            step_count: 0,
            collisions: CollisionManager::new(),
            resolver: ContactResolver::new(),
            error_handler: None,
        }
    }
}

impl Motion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.run_state = RunState::Running;
    }

    pub fn pause(&mut self) {
        self.run_state = RunState::Stopped;
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn set_error_handler(&mut self, f: impl FnMut(DomainError) + 'static) {
        self.error_handler = Some(Box::new(f));
    }

    /// Run the physics portion of one step: forces, integration, collision
    /// detection, resolution, and the sleep heuristic.
    pub fn step(&mut self, heap: &mut BodyHeap, boundaries: &BoundaryManager, forces: &ForceManager) {
        puffin::profile_function!();

        self.apply_forces_and_integrate(heap, forces);
        self.collisions.detect(heap, boundaries);
        self.resolver.resolve(heap, self.collisions.manifolds());
        self.update_sleep_states(heap);

        self.step_count += 1;
    }

    fn apply_forces_and_integrate(&mut self, heap: &mut BodyHeap, forces: &ForceManager) {
        puffin::profile_scope!("integrate");

        for id in heap.ids().collect::<Vec<_>>() {
            let Some(body) = heap.get_mut(id) else {
                continue;
            };
            if body.state() != BodyState::Simulate {
                continue;
            }
            forces.apply_linear_force(body);
            forces.apply_angular_force(body);
            body.integrate();

            if !body.has_finite_state() {
                body.mark_asleep_on_error();
                if let Some(handler) = self.error_handler.as_mut() {
                    handler(DomainError);
                }
            }
        }
    }

    fn update_sleep_states(&mut self, heap: &mut BodyHeap) {
        puffin::profile_scope!("sleep");

        for id in heap.ids().collect::<Vec<_>>() {
            if let Some(body) = heap.get_mut(id) {
                body.update_sleep_state();
            }
        }
    }

}
