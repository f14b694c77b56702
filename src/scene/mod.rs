//! Scene-node interface consumed by the retargeter.
//!
//! The host engine owns its scene graph; the retargeter reaches it only
//! through [`SceneGraph`]. [`Hierarchy`] is a self-contained arena
//! implementation used by the replay daemon and the tests.

mod hierarchy;

use std::fmt::Debug;
use std::hash::Hash;

pub use hierarchy::{Hierarchy, NodeId, TransformWrite};

use crate::core::types::{Quaternion, Vec3};

/// Minimal transform hierarchy.
///
/// Local values are relative to the parent; world values are composed down
/// from the root (translation, rotation, then scale per level).
pub trait SceneGraph {
    type Node: Copy + Eq + Hash + Debug;

    fn name(&self, node: Self::Node) -> &str;
    fn set_name(&mut self, node: Self::Node, name: &str);

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    fn child_count(&self, node: Self::Node) -> usize;
    fn child(&self, node: Self::Node, index: usize) -> Option<Self::Node>;

    fn local_position(&self, node: Self::Node) -> Vec3;
    fn set_local_position(&mut self, node: Self::Node, position: Vec3);
    fn local_rotation(&self, node: Self::Node) -> Quaternion;
    fn set_local_rotation(&mut self, node: Self::Node, rotation: Quaternion);
    fn local_scale(&self, node: Self::Node) -> Vec3;
    fn set_local_scale(&mut self, node: Self::Node, scale: Vec3);

    fn world_position(&self, node: Self::Node) -> Vec3;
    fn set_world_position(&mut self, node: Self::Node, position: Vec3);
    fn world_rotation(&self, node: Self::Node) -> Quaternion;
    fn set_world_rotation(&mut self, node: Self::Node, rotation: Quaternion);

    /// Convert a world-space point into `node`'s local space.
    fn inverse_transform_point(&self, node: Self::Node, point: Vec3) -> Vec3;

    /// Children in order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node> {
        (0..self.child_count(node))
            .filter_map(|i| self.child(node, i))
            .collect()
    }
}
