//! Skeleton resolver: matches local nodes to stream segments.
//!
//! Two phases over the local hierarchy, both pre-order with an explicit stack:
//!
//! 1. **Search**: walk the caller's root and its subtree until a node whose
//!    stripped name equals the subject's root segment is found.
//! 2. **Descend**: take the matched node and every node beneath it, in
//!    document order, without further name matching against the stream.
//!
//! Each mapped node queries the segment named after its own stripped name, so
//! the local child order only decides visiting order. Nodes below the match
//! that the stream doesn't know simply fail their queries.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use crate::scene::SceneGraph;

/// Strip a namespace prefix: `"ns:Root"` -> `"Root"`.
///
/// Only the text after the last `:` is kept, so nested namespaces
/// (`"rig:ns:Hand"`) still reduce to the segment name. Segment names from
/// the stream never contain `:`, so keeping the second piece would leave
/// `"ns:Hand"` and never match.
pub fn strip_namespace(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// One node of the mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedNode<N> {
    pub node: N,
    /// Segment queried for this node.
    pub segment: String,
}

/// Result of a resolve: nodes in visiting order, indexed by segment name.
#[derive(Debug, Clone)]
pub struct NodeMapping<N> {
    entries: Vec<MappedNode<N>>,
    index: HashMap<String, usize>,
    duplicates: usize,
}

impl<N: Copy + Eq + Hash> NodeMapping<N> {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            duplicates: 0,
        }
    }

    fn insert(&mut self, node: N, segment: &str) -> bool {
        match self.index.entry(segment.to_string()) {
            Entry::Occupied(_) => {
                self.duplicates += 1;
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push(MappedNode {
                    node,
                    segment: segment.to_string(),
                });
                true
            }
        }
    }

    /// Node matched to the subject's root segment.
    pub fn root(&self) -> Option<N> {
        self.entries.first().map(|e| e.node)
    }

    pub fn entries(&self) -> &[MappedNode<N>] {
        &self.entries
    }

    pub fn get(&self, segment: &str) -> Option<N> {
        self.index.get(segment).map(|&i| self.entries[i].node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nodes skipped because their stripped name was already mapped.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Build a mapping below `root` for the skeleton rooted at `root_segment`.
pub fn build_mapping<G: SceneGraph>(
    scene: &G,
    root: G::Node,
    root_segment: &str,
) -> NodeMapping<G::Node> {
    let mut mapping = NodeMapping::empty();

    // Phase 1: search
    let mut stack = vec![root];
    let mut matched = None;
    while let Some(node) = stack.pop() {
        if strip_namespace(scene.name(node)) == root_segment {
            matched = Some(node);
            break;
        }
        let mut children = scene.children(node);
        children.reverse();
        stack.extend(children);
    }
    let Some(matched) = matched else {
        return mapping;
    };

    // Phase 2: descend
    stack.clear();
    stack.push(matched);
    while let Some(node) = stack.pop() {
        let name = scene.name(node);
        let segment = strip_namespace(name);
        if !mapping.insert(node, segment) {
            log::warn!("Node '{}' maps to already-mapped segment '{}', skipped", name, segment);
        }
        let mut children = scene.children(node);
        children.reverse();
        stack.extend(children);
    }
    mapping
}

/// Caches the mapping per `(root node, root segment)`.
#[derive(Debug)]
pub struct SkeletonResolver<N> {
    cached: Option<(N, String, NodeMapping<N>)>,
    builds: u64,
}

impl<N> Default for SkeletonResolver<N> {
    fn default() -> Self {
        Self {
            cached: None,
            builds: 0,
        }
    }
}

impl<N: Copy + Eq + Hash> SkeletonResolver<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping for `root`/`root_segment`, rebuilt if either changed.
    pub fn resolve<G>(&mut self, scene: &G, root: N, root_segment: &str) -> &NodeMapping<N>
    where
        G: SceneGraph<Node = N>,
    {
        let stale = match &self.cached {
            Some((node, segment, _)) => *node != root || segment != root_segment,
            None => true,
        };
        if stale {
            self.cached = None;
        }
        let (_, _, mapping) = self.cached.get_or_insert_with(|| {
            let mapping = build_mapping(scene, root, root_segment);
            self.builds += 1;
            log::debug!(
                "Resolved '{}': {} nodes ({} duplicates)",
                root_segment,
                mapping.len(),
                mapping.duplicates()
            );
            (root, root_segment.to_string(), mapping)
        });
        mapping
    }

    /// Force a rebuild on the next resolve, e.g. after the hierarchy changed.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Number of mapping builds so far.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}
