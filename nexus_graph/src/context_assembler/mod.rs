//! Context Assembler - turns free-text keywords into a bounded graph context.
//!
//! Retrieval works in four steps:
//! 1. **Anchor search**: each keyword matches at most `anchors_per_keyword`
//!    node names (case-insensitive substring) within the session
//! 2. **De-duplication**: anchors are kept once, in first-seen order
//! 3. **Expansion**: one traversal collects the direct edges of all anchors,
//!    capped at `neighborhood_limit`
//! 4. **Rendering**: entities and relationships become a prompt-ready text

mod anchors;

pub use anchors::*;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nexus_schema::SessionId;

use crate::config::RetrievalConfig;
use crate::error::GraphError;
use crate::knowledge_base::{EdgeRecord, GraphStore, NodeRecord};

/// Returned when no keyword matched any node.
pub const NO_MATCHES_CONTEXT: &str =
    "No direct matches found in knowledge graph for these keywords.";

/// Prefix of the context returned when the store could not be read.
pub const FAILURE_PREFIX: &str = "Error retrieving context: ";

/// How retrieval ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextStatus {
    Found,
    NoMatches,
    Failed(String),
}

/// The outcome handed to the answering step: rendered text plus raw records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub status: ContextStatus,
    pub anchors: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub text: String,
}

impl RetrievedContext {
    fn no_matches() -> Self {
        Self {
            status: ContextStatus::NoMatches,
            anchors: Vec::new(),
            edges: Vec::new(),
            text: NO_MATCHES_CONTEXT.to_string(),
        }
    }

    fn failed(err: &GraphError) -> Self {
        Self {
            status: ContextStatus::Failed(err.to_string()),
            anchors: Vec::new(),
            edges: Vec::new(),
            text: format!("{FAILURE_PREFIX}{err}"),
        }
    }

    /// Check if anchors were found and expanded.
    pub fn is_found(&self) -> bool {
        self.status == ContextStatus::Found
    }
}

/// Builds retrieval contexts from a shared store.
pub struct ContextAssembler {
    store: Arc<GraphStore>,
    config: RetrievalConfig,
}

impl ContextAssembler {
    /// Create an assembler over a shared store.
    pub fn new(store: Arc<GraphStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    /// Run anchor search and neighborhood expansion for `keywords`.
    ///
    /// Never fails: a store error becomes a `Failed` context whose text starts
    /// with [`FAILURE_PREFIX`], and no anchors yield [`NO_MATCHES_CONTEXT`].
    pub fn retrieve<S: AsRef<str>>(&self, keywords: &[S], session_id: &SessionId) -> RetrievedContext {
        let anchors = match self.find_anchors(keywords, session_id) {
            Ok(anchors) => anchors,
            Err(e) => return RetrievedContext::failed(&e),
        };
        if anchors.is_empty() {
            debug!(session = %session_id, "no anchors matched");
            return RetrievedContext::no_matches();
        }

        let edges = match self.store.get_neighborhood(
            &anchors.ids(),
            session_id,
            self.config.neighborhood_limit,
        ) {
            Ok(edges) => edges,
            Err(e) => return RetrievedContext::failed(&e),
        };

        let anchors = anchors.into_vec();
        let text = render(&anchors, &edges, self.config.snippet_chars);
        info!(
            session = %session_id,
            anchors = anchors.len(),
            edges = edges.len(),
            chars = text.len(),
            "retrieved graph context"
        );

        RetrievedContext {
            status: ContextStatus::Found,
            anchors,
            edges,
            text,
        }
    }

    /// Union of per-keyword matches. Blank keywords are ignored.
    pub fn find_anchors<S: AsRef<str>>(
        &self,
        keywords: &[S],
        session_id: &SessionId,
    ) -> Result<AnchorSet, GraphError> {
        let mut anchors = AnchorSet::new();
        for keyword in keywords.iter().map(|k| k.as_ref().trim()) {
            if keyword.is_empty() {
                continue;
            }
            let matches =
                self.store
                    .search_nodes(keyword, session_id, self.config.anchors_per_keyword)?;
            let added = anchors.extend(matches);
            debug!(keyword, added, total = anchors.len(), "anchor search");
        }
        Ok(anchors)
    }
}

/// Split a comma-separated keyword list; fall back to `question` when empty.
pub fn parse_keywords(raw: &str, question: &str) -> Vec<String> {
    let keywords: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();

    if keywords.is_empty() {
        vec![question.trim().to_string()]
    } else {
        keywords
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut cut: String = text.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

/// Render the two-section context. The relationships section is omitted
/// when there are no edges.
pub fn render(anchors: &[NodeRecord], edges: &[EdgeRecord], snippet_chars: usize) -> String {
    let mut out = String::new();

    out.push_str("**Relevant Entities:**\n");
    for node in anchors {
        out.push_str(&format!("- {} ({})", node.name, node.label));
        if let Some(description) = node.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(": {}", snippet(description, snippet_chars)));
        }
        out.push('\n');
    }

    if !edges.is_empty() {
        out.push_str("\n**Key Relationships:**\n");
        for edge in edges {
            out.push_str(&format!(
                "- {} --[{}]--> {}\n",
                edge.source, edge.relationship, edge.target
            ));
            if let Some(evidence) = edge.evidence.as_deref().filter(|e| !e.is_empty()) {
                out.push_str(&format!("  (Evidence: {})\n", snippet(evidence, snippet_chars)));
            }
        }
    }

    out.truncate(out.trim_end().len());
    out
}
