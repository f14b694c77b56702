//! Last-known-good pose per node.

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::types::{Quaternion, Vec3};
use crate::scene::SceneGraph;

/// A value plus the space it was written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement<T> {
    /// Parent-relative.
    Local(T),
    /// World space (node without a parent).
    World(T),
}

impl<T: Copy> Placement<T> {
    pub fn value(&self) -> T {
        match self {
            Placement::Local(v) | Placement::World(v) => *v,
        }
    }
}

impl Placement<Quaternion> {
    pub fn write<G: SceneGraph>(&self, scene: &mut G, node: G::Node) {
        match *self {
            Placement::Local(q) => scene.set_local_rotation(node, q),
            Placement::World(q) => scene.set_world_rotation(node, q),
        }
    }
}

impl Placement<Vec3> {
    pub fn write<G: SceneGraph>(&self, scene: &mut G, node: G::Node) {
        match *self {
            Placement::Local(p) => scene.set_local_position(node, p),
            Placement::World(p) => scene.set_world_position(node, p),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CachedPose {
    rotation: Option<Placement<Quaternion>>,
    position: Option<Placement<Vec3>>,
}

/// Rotation and position slots per node, filled independently.
///
/// Entries are created on first success and only ever overwritten.
#[derive(Debug, Clone)]
pub struct PoseCache<N> {
    entries: HashMap<N, CachedPose>,
}

impl<N> Default for PoseCache<N> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<N: Copy + Eq + Hash> PoseCache<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_rotation(&mut self, node: N, rotation: Placement<Quaternion>) {
        self.entries.entry(node).or_default().rotation = Some(rotation);
    }

    pub fn store_position(&mut self, node: N, position: Placement<Vec3>) {
        self.entries.entry(node).or_default().position = Some(position);
    }

    pub fn rotation(&self, node: N) -> Option<Placement<Quaternion>> {
        self.entries.get(&node).and_then(|c| c.rotation)
    }

    pub fn position(&self, node: N) -> Option<Placement<Vec3>> {
        self.entries.get(&node).and_then(|c| c.position)
    }

    pub fn has_rotation(&self, node: N) -> bool {
        self.rotation(node).is_some()
    }

    pub fn has_position(&self, node: N) -> bool {
        self.position(node).is_some()
    }

    /// Nodes with at least one cached component.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
