//! Anchor set for the anchor search phase.

use std::collections::HashSet;

use crate::knowledge_base::{NodeId, NodeRecord};

/// Anchors collected across keywords, unique by node id, first-seen order.
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    seen: HashSet<NodeId>,
    anchors: Vec<NodeRecord>,
}

impl AnchorSet {
    /// Create an empty anchor set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match; returns false when the node is already anchored.
    pub fn insert(&mut self, node: NodeRecord) -> bool {
        if !self.seen.insert(node.id) {
            return false;
        }
        self.anchors.push(node);
        true
    }

    /// Add every match of one keyword, returning how many were new.
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = NodeRecord>) -> usize {
        let mut added = 0;
        for node in nodes {
            if self.insert(node) {
                added += 1;
            }
        }
        added
    }

    /// Number of distinct anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Check if no keyword matched.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Anchor ids in first-seen order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.anchors.iter().map(|n| n.id).collect()
    }

    /// Consume the set, yielding anchors in first-seen order.
    pub fn into_vec(self) -> Vec<NodeRecord> {
        self.anchors
    }
}
