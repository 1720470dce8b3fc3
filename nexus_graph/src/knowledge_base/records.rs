//! Records returned by the store.

use serde::{Deserialize, Serialize};

/// Store-assigned node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node matched by name search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    /// Primary label, e.g. `Organization`.
    pub label: String,
    pub description: Option<String>,
}

/// One edge of a neighborhood, in its stored direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub relationship: String,
    pub target: String,
    pub evidence: Option<String>,
}

/// Node and edge counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: u64,
    pub edges: u64,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Written,
    Skipped(SkipReason),
}

/// Why a malformed record was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyName,
    /// Source or target is not present in the session.
    MissingEndpoint,
}

/// A node as shown to the administrative surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedNode {
    pub id: NodeId,
    pub name: String,
    pub label: String,
    pub session_id: String,
    pub query_id: String,
    pub description: Option<String>,
}

/// An edge as shown to the administrative surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub relationship: String,
    pub evidence: Option<String>,
    pub query_id: String,
}
