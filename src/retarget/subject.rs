//! Subject-level retargeting: one stream subject onto one local hierarchy.

use std::hash::Hash;

use crate::io::protocol::DataStreamClient;
use crate::io::session::StreamSession;
use crate::scene::SceneGraph;

use super::resolver::SkeletonResolver;
use super::retargeter::{PoseRetargeter, RetargetOptions, RetargetReport, Space};
use super::RetargetError;

/// Drives an articulated subject onto the skeleton found under a local root.
///
/// Each tick: query the subject's root segment, resolve (or reuse) the node
/// mapping, then retarget every mapped node in visiting order.
#[derive(Debug)]
pub struct SubjectRetargeter<N> {
    subject: String,
    resolver: SkeletonResolver<N>,
    poses: PoseRetargeter<N>,
}

impl<N: Copy + Eq + Hash> SubjectRetargeter<N> {
    pub fn new(subject: impl Into<String>, options: RetargetOptions) -> Self {
        Self {
            subject: subject.into(),
            resolver: SkeletonResolver::new(),
            poses: PoseRetargeter::new(options),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn resolver(&self) -> &SkeletonResolver<N> {
        &self.resolver
    }

    pub fn poses(&self) -> &PoseRetargeter<N> {
        &self.poses
    }

    /// Rebuild the node mapping on the next tick.
    pub fn invalidate_mapping(&mut self) {
        self.resolver.invalidate();
    }

    /// Retarget one frame onto the hierarchy below `root`.
    ///
    /// A subject missing from the frame is reported, not an error.
    pub fn retarget<C, G>(
        &mut self,
        session: &StreamSession<C>,
        scene: &mut G,
        root: Option<N>,
    ) -> Result<RetargetReport, RetargetError>
    where
        C: DataStreamClient,
        G: SceneGraph<Node = N>,
    {
        if self.subject.trim().is_empty() {
            return Err(RetargetError::EmptySubjectName);
        }
        let root = root.ok_or_else(|| RetargetError::MissingRootNode(self.subject.clone()))?;

        let mut report = RetargetReport::default();
        let Some(root_segment) = session.subject_root_segment_name(&self.subject).ok() else {
            report.subject_missing = true;
            return Ok(report);
        };

        let mapping = self.resolver.resolve(&*scene, root, &root_segment);
        if mapping.is_empty() {
            log::debug!(
                "No node named '{}' under root for subject '{}'",
                root_segment,
                self.subject
            );
            report.root_unmatched = true;
            return Ok(report);
        }

        for entry in mapping.entries() {
            let node_report = self.poses.apply(
                session,
                scene,
                &self.subject,
                &entry.segment,
                entry.node,
                Space::Hierarchical,
            );
            report.merge(&node_report);
        }
        Ok(report)
    }
}

/// Drives a single node from a subject's root segment, in world space.
#[derive(Debug)]
pub struct RigidBodyRetargeter<N> {
    subject: String,
    poses: PoseRetargeter<N>,
}

impl<N: Copy + Eq + Hash> RigidBodyRetargeter<N> {
    pub fn new(subject: impl Into<String>, options: RetargetOptions) -> Self {
        Self {
            subject: subject.into(),
            poses: PoseRetargeter::new(options),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn retarget<C, G>(
        &mut self,
        session: &StreamSession<C>,
        scene: &mut G,
        node: Option<N>,
    ) -> Result<RetargetReport, RetargetError>
    where
        C: DataStreamClient,
        G: SceneGraph<Node = N>,
    {
        if self.subject.trim().is_empty() {
            return Err(RetargetError::EmptySubjectName);
        }
        let node = node.ok_or_else(|| RetargetError::MissingRootNode(self.subject.clone()))?;

        let Some(root_segment) = session.subject_root_segment_name(&self.subject).ok() else {
            return Ok(RetargetReport {
                subject_missing: true,
                ..RetargetReport::default()
            });
        };
        Ok(self
            .poses
            .apply(session, scene, &self.subject, &root_segment, node, Space::World))
    }
}
