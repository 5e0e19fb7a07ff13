//! Storage for live bodies.
//!
//! Grounded on the teacher's hecs-`World`-backed body storage in
//! `physics/mod.rs`, replaced with a `slotmap` (already in the teacher's
//! stack for stable indices elsewhere) paired with an explicit insertion
//! order so iteration is deterministic across a step and between steps.

use slotmap::SlotMap;

use crate::body::{Body, BodyId};
use crate::error::ConfigError;

/// Stores every dynamic/kinematic body and the order they were inserted in.
#[derive(Default)]
pub struct BodyHeap {
    bodies: SlotMap<BodyId, Body>,
    order: Vec<BodyId>,
}

impl BodyHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-constructed body, recording its insertion order.
    pub fn append(&mut self, body: Body) -> Result<BodyId, ConfigError> {
        let id = self.bodies.insert(body);
        self.order.push(id);
        Ok(id)
    }

    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let removed = self.bodies.remove(id);
        if removed.is_some() {
            self.order.retain(|&existing| existing != id);
        }
        removed
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Live bodies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.order
            .iter()
            .filter_map(move |id| self.bodies.get(*id).map(|body| (*id, body)))
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.order.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyConfig, BodyKind, Shape};

    fn sample_body() -> Body {
        Body::new(
            BodyConfig {
                shape: Shape::Circle { radius: 5.0 },
                ..Default::default()
            },
            BodyKind::Circle,
        )
        .unwrap()
    }

    #[test]
    fn append_then_remove_shrinks_len() {
        let mut heap = BodyHeap::new();
        let id = heap.append(sample_body()).unwrap();
        assert_eq!(heap.len(), 1);
        heap.remove(id);
        assert_eq!(heap.len(), 0);
        assert!(heap.get(id).is_none());
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut heap = BodyHeap::new();
        let first = heap.append(sample_body()).unwrap();
        let second = heap.append(sample_body()).unwrap();
        let ids: Vec<_> = heap.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn clear_empties_heap() {
        let mut heap = BodyHeap::new();
        heap.append(sample_body()).unwrap();
        heap.append(sample_body()).unwrap();
        heap.clear();
        assert!(heap.is_empty());
    }
}
