//! Directed, typed edges between entities.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A directed connection between two entities, referenced by name.
///
/// The type is free-form (`WORKS_AT`, `founded by`, `Invested In`, ...) and is
/// normalized before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Short quote or context supporting the relationship.
    #[serde(default)]
    pub evidence: Option<String>,
}

impl Relationship {
    /// Create a relationship of `rel_type` from `source` to `target`.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        rel_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            rel_type: rel_type.into(),
            evidence: None,
        }
    }

    /// Attach the supporting text span.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Source name, trimmed.
    pub fn source_name(&self) -> &str {
        self.source.trim()
    }

    /// Target name, trimmed.
    pub fn target_name(&self) -> &str {
        self.target.trim()
    }

    /// Uppercase token with spaces replaced by underscores.
    pub fn normalized_type(&self) -> String {
        normalize_type(&self.rel_type)
    }

    /// Both endpoints must be named.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_name().is_empty() {
            return Err(ValidationError::EmptyEndpoint { endpoint: "source" });
        }
        if self.target_name().is_empty() {
            return Err(ValidationError::EmptyEndpoint { endpoint: "target" });
        }
        Ok(())
    }
}

/// Normalize a free-form relationship label.
pub fn normalize_type(raw: &str) -> String {
    raw.trim().to_uppercase().replace(' ', "_")
}

/// Whether a normalized type can be stored as an edge label.
pub fn is_well_formed_type(normalized: &str) -> bool {
    !normalized.is_empty()
        && normalized
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
}
