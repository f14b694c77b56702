//! Retargeting layer: maps stream skeletons onto local scene hierarchies.
//!
//! - [`resolver`]: local node ↔ segment matching
//! - [`pose_cache`]: last-known-good rotation/position per node
//! - [`retargeter`]: per-node conversion and write-back
//! - [`subject`]: subject-level drivers (articulated and rigid body)

pub mod pose_cache;
pub mod resolver;
pub mod retargeter;
pub mod subject;

pub use pose_cache::{Placement, PoseCache};
pub use resolver::{MappedNode, NodeMapping, SkeletonResolver, build_mapping, strip_namespace};
pub use retargeter::{PoseRetargeter, RetargetOptions, RetargetReport, Space};
pub use subject::{RigidBodyRetargeter, SubjectRetargeter};

/// Configuration errors at the retarget call boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetargetError {
    #[error("subject name is empty")]
    EmptySubjectName,

    #[error("no local root node for subject '{0}'")]
    MissingRootNode(String),
}
