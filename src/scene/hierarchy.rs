//! Arena-backed transform hierarchy.

use crate::core::types::{Quaternion, Vec3};

use super::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which transform component a write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformWrite {
    LocalPosition,
    LocalRotation,
    LocalScale,
    WorldPosition,
    WorldRotation,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Vec3,
    rotation: Quaternion,
    scale: Vec3,
}

/// Scene hierarchy stored in a flat arena.
///
/// Nodes are never removed. Writes can optionally be journaled, which the
/// tests use to tell world-space assignments from parent-relative ones.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<Node>,
    journal: Option<Vec<(NodeId, TransformWrite)>>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_root(&mut self, name: &str) -> NodeId {
        self.push(name, None)
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.push(name, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            position: Vec3::ZERO,
            rotation: Quaternion::identity(),
            scale: Vec3::ONE,
        });
        id
    }

    /// Nodes without a parent, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| NodeId(i))
    }

    /// First node with this exact name, pre-order from each root.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots().collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Start journaling transform writes.
    pub fn record_writes(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Writes since the last call.
    pub fn take_writes(&mut self) -> Vec<(NodeId, TransformWrite)> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn note(&mut self, node: NodeId, write: TransformWrite) {
        if let Some(journal) = &mut self.journal {
            journal.push((node, write));
        }
    }

    /// Ancestors from the root down to and including `node`.
    fn chain(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }
}

impl SceneGraph for Hierarchy {
    type Node = NodeId;

    fn name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].name
    }

    fn set_name(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].name = name.to_string();
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node.0].children.len()
    }

    fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[node.0].children.get(index).copied()
    }

    fn local_position(&self, node: NodeId) -> Vec3 {
        self.nodes[node.0].position
    }

    fn set_local_position(&mut self, node: NodeId, position: Vec3) {
        self.nodes[node.0].position = position;
        self.note(node, TransformWrite::LocalPosition);
    }

    fn local_rotation(&self, node: NodeId) -> Quaternion {
        self.nodes[node.0].rotation
    }

    fn set_local_rotation(&mut self, node: NodeId, rotation: Quaternion) {
        self.nodes[node.0].rotation = rotation;
        self.note(node, TransformWrite::LocalRotation);
    }

    fn local_scale(&self, node: NodeId) -> Vec3 {
        self.nodes[node.0].scale
    }

    fn set_local_scale(&mut self, node: NodeId, scale: Vec3) {
        self.nodes[node.0].scale = scale;
        self.note(node, TransformWrite::LocalScale);
    }

    fn world_position(&self, node: NodeId) -> Vec3 {
        let mut p = self.nodes[node.0].position;
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            let n = &self.nodes[parent.0];
            p = n.position + n.rotation.rotate(p.component_mul(&n.scale));
            current = parent;
        }
        p
    }

    fn set_world_position(&mut self, node: NodeId, position: Vec3) {
        let local = match self.nodes[node.0].parent {
            Some(parent) => self.inverse_transform_point(parent, position),
            None => position,
        };
        self.nodes[node.0].position = local;
        self.note(node, TransformWrite::WorldPosition);
    }

    fn world_rotation(&self, node: NodeId) -> Quaternion {
        self.chain(node)
            .into_iter()
            .fold(Quaternion::identity(), |acc, id| acc * self.nodes[id.0].rotation)
    }

    fn set_world_rotation(&mut self, node: NodeId, rotation: Quaternion) {
        let local = match self.nodes[node.0].parent {
            Some(parent) => self.world_rotation(parent).inverse() * rotation,
            None => rotation,
        };
        self.nodes[node.0].rotation = local;
        self.note(node, TransformWrite::WorldRotation);
    }

    fn inverse_transform_point(&self, node: NodeId, point: Vec3) -> Vec3 {
        self.chain(node).into_iter().fold(point, |p, id| {
            let n = &self.nodes[id.0];
            n.rotation
                .inverse()
                .rotate(p - n.position)
                .component_div(&n.scale)
        })
    }
}
