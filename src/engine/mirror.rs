//! Build a local hierarchy that mirrors a stream skeleton.

use crate::io::protocol::DataStreamClient;
use crate::io::session::StreamSession;
use crate::scene::{Hierarchy, NodeId};

/// Add nodes for every segment of `subject` under `parent`.
///
/// Nodes are named `namespace:Segment` and added in the stream's child
/// order. Returns the node of the root segment, or `None` if the subject is
/// not in the current frame.
pub fn mirror_subject<C: DataStreamClient>(
    session: &StreamSession<C>,
    subject: &str,
    hierarchy: &mut Hierarchy,
    parent: NodeId,
    namespace: &str,
) -> Option<NodeId> {
    let root_segment = session.subject_root_segment_name(subject).ok()?;
    let node_name = |segment: &str| {
        if namespace.is_empty() {
            segment.to_string()
        } else {
            format!("{namespace}:{segment}")
        }
    };

    let root = hierarchy.add_child(parent, &node_name(&root_segment));
    let mut stack = vec![(root_segment, root)];
    while let Some((segment, node)) = stack.pop() {
        let count = session.segment_child_count(subject, &segment).ok().unwrap_or(0);
        for i in 0..count {
            if let Some(child) = session.segment_child_name(subject, &segment, i).ok() {
                let child_node = hierarchy.add_child(node, &node_name(&child));
                stack.push((child, child_node));
            }
        }
    }
    log::debug!(
        "Mirrored subject '{}' ({} nodes total)",
        subject,
        hierarchy.len()
    );
    Some(root)
}
