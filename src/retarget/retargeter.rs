//! Per-node pose retargeting.
//!
//! For each node, rotation, translation and (optionally) scale are pulled
//! from the session, converted into scene axes and written either
//! parent-relative or, for nodes without a parent, in world space.
//!
//! ```text
//! rotation:     q = axis(q_stream)
//!               parent ? local = inverse(parent.world_rot) * q : world = q
//! translation:  p = axis(t_mm * 0.001) + offset       (t_mm descaled if scale-aware)
//!               parent ? local = parent.inverse_transform_point(p) : world = p
//! scale:        scale-aware ? local_scale = s
//! ```
//!
//! Rotation and translation each fall back to their own cached value when
//! the stream can't provide them this frame.

use crate::core::axis::AxisMap;
use crate::core::types::{Quaternion, Vec3};
use crate::io::protocol::DataStreamClient;
use crate::io::session::StreamSession;
use crate::scene::SceneGraph;

use super::pose_cache::{Placement, PoseCache};

/// Conversion settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetargetOptions {
    pub axis_map: AxisMap,
    /// Use ancestor-descaled translations and write segment scale.
    pub scale_aware: bool,
    /// Added to every converted position, in scene units.
    pub position_offset: Vec3,
}

impl Default for RetargetOptions {
    fn default() -> Self {
        Self {
            axis_map: AxisMap::default(),
            scale_aware: false,
            position_offset: Vec3::ZERO,
        }
    }
}

impl RetargetOptions {
    pub fn from_config(config: &crate::config::RetargetConfig) -> Self {
        Self {
            axis_map: config.axis_map,
            scale_aware: config.scale_aware,
            position_offset: config.offset(),
        }
    }
}

/// Counts for one retarget pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetargetReport {
    pub nodes: usize,
    pub rotations_applied: usize,
    pub rotations_cached: usize,
    pub rotations_missed: usize,
    pub positions_applied: usize,
    pub positions_cached: usize,
    pub positions_missed: usize,
    pub scales_applied: usize,
    /// Subject or its root segment not in the current frame.
    pub subject_missing: bool,
    /// Root segment not found under the local root.
    pub root_unmatched: bool,
}

impl RetargetReport {
    pub fn merge(&mut self, other: &RetargetReport) {
        self.nodes += other.nodes;
        self.rotations_applied += other.rotations_applied;
        self.rotations_cached += other.rotations_cached;
        self.rotations_missed += other.rotations_missed;
        self.positions_applied += other.positions_applied;
        self.positions_cached += other.positions_cached;
        self.positions_missed += other.positions_missed;
        self.scales_applied += other.scales_applied;
        self.subject_missing |= other.subject_missing;
        self.root_unmatched |= other.root_unmatched;
    }
}

/// Where a node's pose is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Parent-relative when the node has a parent, world otherwise.
    Hierarchical,
    /// Always world space.
    World,
}

/// Applies segment poses to nodes, remembering the last good values.
#[derive(Debug)]
pub struct PoseRetargeter<N> {
    options: RetargetOptions,
    cache: PoseCache<N>,
}

impl<N: Copy + Eq + std::hash::Hash> PoseRetargeter<N> {
    pub fn new(options: RetargetOptions) -> Self {
        Self {
            options,
            cache: PoseCache::new(),
        }
    }

    pub fn options(&self) -> &RetargetOptions {
        &self.options
    }

    pub fn cache(&self) -> &PoseCache<N> {
        &self.cache
    }

    /// Retarget one node from `segment` of `subject`.
    pub fn apply<C, G>(
        &mut self,
        session: &StreamSession<C>,
        scene: &mut G,
        subject: &str,
        segment: &str,
        node: N,
        space: Space,
    ) -> RetargetReport
    where
        C: DataStreamClient,
        G: SceneGraph<Node = N>,
    {
        let mut report = RetargetReport {
            nodes: 1,
            ..RetargetReport::default()
        };
        let parent = match space {
            Space::Hierarchical => scene.parent(node),
            Space::World => None,
        };

        // Rotation
        match session.segment_rotation(subject, segment).ok() {
            Some(raw) => {
                let q = self
                    .options
                    .axis_map
                    .convert_rotation(Quaternion::from_xyzw(raw));
                let placement = match parent {
                    Some(p) => Placement::Local(scene.world_rotation(p).inverse() * q),
                    None => Placement::World(q),
                };
                placement.write(scene, node);
                self.cache.store_rotation(node, placement);
                report.rotations_applied += 1;
            }
            None => match self.cache.rotation(node) {
                Some(cached) => {
                    cached.write(scene, node);
                    report.rotations_cached += 1;
                }
                None => report.rotations_missed += 1,
            },
        }

        // Translation
        let translation = if self.options.scale_aware {
            session.scaled_segment_translation(subject, segment)
        } else {
            session.segment_translation(subject, segment)
        };
        match translation.ok() {
            Some(mm) => {
                let world = self
                    .options
                    .axis_map
                    .convert_position_mm(Vec3::from_array(mm))
                    + self.options.position_offset;
                let placement = match parent {
                    Some(p) => Placement::Local(scene.inverse_transform_point(p, world)),
                    None => Placement::World(world),
                };
                placement.write(scene, node);
                self.cache.store_position(node, placement);
                report.positions_applied += 1;
            }
            None => match self.cache.position(node) {
                Some(cached) => {
                    cached.write(scene, node);
                    report.positions_cached += 1;
                }
                None => report.positions_missed += 1,
            },
        }

        // Scale
        if self.options.scale_aware {
            let scale = session.segment_static_scale(subject, segment);
            if scale.status.is_success() {
                scene.set_local_scale(node, Vec3::from_array(scale.value));
                report.scales_applied += 1;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::bag::{FrameSnapshot, SegmentSample, SimulatedClient, SubjectFrame};
    use crate::io::hosts::HostList;
    use crate::io::session::{AcquisitionMode, SessionOptions};
    use crate::scene::{Hierarchy, NodeId, TransformWrite};
    use approx::assert_relative_eq;
    use std::sync::atomic::AtomicBool;

    fn frame(rotation: [f64; 4], translation: [f64; 3], scale: Option<[f64; 3]>) -> FrameSnapshot {
        FrameSnapshot {
            frame_number: 1,
            subjects: vec![SubjectFrame {
                name: "Wand".into(),
                segments: vec![SegmentSample {
                    name: "Wand".into(),
                    parent: None,
                    rotation,
                    translation,
                    scale,
                    occluded: false,
                }],
                markers: Vec::new(),
            }],
        }
    }

    fn session(frames: Vec<FrameSnapshot>) -> StreamSession<SimulatedClient> {
        let options = SessionOptions::new(HostList::parse("localhost", 801), AcquisitionMode::ServerPush);
        let s = StreamSession::new(SimulatedClient::from_frames(frames), options);
        s.connect(&AtomicBool::new(true)).unwrap();
        s.configure().unwrap();
        s
    }

    fn node_under_parent() -> (Hierarchy, NodeId, NodeId) {
        let mut h = Hierarchy::new();
        let parent = h.add_root("Stage");
        h.set_local_position(parent, Vec3::new(0.0, 1.0, 0.0));
        let node = h.add_child(parent, "Wand");
        (h, parent, node)
    }

    #[test]
    fn test_world_space_for_root_node() {
        let s = session(vec![frame([0.0, 0.0, 0.0, 1.0], [1000.0, 2000.0, 3000.0], None)]);
        let mut h = Hierarchy::new();
        let node = h.add_root("Wand");
        h.record_writes();

        let mut retargeter = PoseRetargeter::new(RetargetOptions::default());
        let report = retargeter.apply(&s, &mut h, "Wand", "Wand", node, Space::Hierarchical);

        // (-y, z, x)
        let p = h.world_position(node);
        assert_relative_eq!(p.x, -2.0);
        assert_relative_eq!(p.y, 3.0);
        assert_relative_eq!(p.z, 1.0);
        assert_eq!(
            h.take_writes(),
            vec![
                (node, TransformWrite::WorldRotation),
                (node, TransformWrite::WorldPosition)
            ]
        );
        assert_eq!(report.rotations_applied, 1);
        assert_eq!(report.positions_applied, 1);
    }

    #[test]
    fn test_offset_and_parent_relative_position() {
        let s = session(vec![frame([0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1000.0], None)]);
        let (mut h, _, node) = node_under_parent();
        let options = RetargetOptions {
            position_offset: Vec3::new(0.5, 0.0, 0.0),
            ..RetargetOptions::default()
        };

        let mut retargeter = PoseRetargeter::new(options);
        retargeter.apply(&s, &mut h, "Wand", "Wand", node, Space::Hierarchical);

        // world (0.5, 1, 0) under a parent at (0, 1, 0)
        let local = h.local_position(node);
        assert_relative_eq!(local.x, 0.5);
        assert_relative_eq!(local.y, 0.0);
        let world = h.world_position(node);
        assert_relative_eq!(world.y, 1.0);
    }

    #[test]
    fn test_world_space_override_ignores_parent() {
        let s = session(vec![frame([0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0], None)]);
        let (mut h, _, node) = node_under_parent();
        h.record_writes();

        let mut retargeter = PoseRetargeter::new(RetargetOptions::default());
        retargeter.apply(&s, &mut h, "Wand", "Wand", node, Space::World);

        assert_eq!(h.take_writes()[0], (node, TransformWrite::WorldRotation));
        assert_relative_eq!(h.world_position(node).y, 0.0);
    }

    #[test]
    fn test_scale_written_when_scale_aware() {
        let s = session(vec![frame([0.0, 0.0, 0.0, 1.0], [0.0; 3], Some([1.0, 2.0, 3.0]))]);
        let mut h = Hierarchy::new();
        let node = h.add_root("Wand");
        let options = RetargetOptions {
            scale_aware: true,
            ..RetargetOptions::default()
        };

        let mut retargeter = PoseRetargeter::new(options);
        let report = retargeter.apply(&s, &mut h, "Wand", "Wand", node, Space::Hierarchical);

        assert_eq!(h.local_scale(node), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(report.scales_applied, 1);
    }

    #[test]
    fn test_unknown_segment_leaves_node_untouched() {
        let s = session(vec![frame([0.0, 0.0, 0.0, 1.0], [10.0; 3], None)]);
        let mut h = Hierarchy::new();
        let node = h.add_root("Other");
        h.set_local_position(node, Vec3::new(7.0, 7.0, 7.0));

        let mut retargeter = PoseRetargeter::new(RetargetOptions::default());
        let report = retargeter.apply(&s, &mut h, "Wand", "Other", node, Space::Hierarchical);

        assert_eq!(h.local_position(node), Vec3::new(7.0, 7.0, 7.0));
        assert_eq!(report.rotations_missed, 1);
        assert_eq!(report.positions_missed, 1);
        assert!(retargeter.cache().is_empty());
    }
}
