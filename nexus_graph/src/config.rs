//! Configuration loading with env-var overrides.
//!
//! Reads a TOML document with `[store]` and `[retrieval]` tables; every key is
//! optional. `NEXUS_GRAPH_PATH` and `NEXUS_STATEMENT_TIMEOUT_MS` override the
//! store section after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Storage backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file, or `:memory:`.
    pub path: PathBuf,
    /// How long a statement waits on a locked database.
    pub busy_timeout_ms: u64,
    /// Hard deadline for any single statement.
    pub statement_timeout_ms: u64,
}

impl StoreConfig {
    /// Private in-memory database with default timeouts.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Database file at `path` with default timeouts.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Check if the path selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }

    /// Lock wait as a `Duration`.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Statement deadline as a `Duration`.
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(IN_MEMORY_PATH),
            busy_timeout_ms: 5_000,
            statement_timeout_ms: 10_000,
        }
    }
}

/// Bounds for anchor search and neighborhood expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum anchors returned per keyword.
    pub anchors_per_keyword: usize,
    /// Maximum edges returned by one expansion, across all anchors.
    pub neighborhood_limit: usize,
    /// Descriptions and evidence are cut to this many characters.
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            anchors_per_keyword: 3,
            neighborhood_limit: 50,
            snippet_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub store: StoreConfig,
    pub retrieval: RetrievalConfig,
}

impl GraphConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> GraphResult<Self> {
        let config: GraphConfig =
            toml::from_str(raw).map_err(|e| GraphError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the TOML file at `path`.
    pub fn load(path: &Path) -> GraphResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GraphError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply `NEXUS_GRAPH_PATH` / `NEXUS_STATEMENT_TIMEOUT_MS` if set.
    pub fn apply_env_overrides(mut self) -> GraphResult<Self> {
        self.apply_overrides(
            std::env::var("NEXUS_GRAPH_PATH").ok(),
            std::env::var("NEXUS_STATEMENT_TIMEOUT_MS").ok(),
        )?;
        Ok(self)
    }

    fn apply_overrides(
        &mut self,
        path: Option<String>,
        statement_timeout_ms: Option<String>,
    ) -> GraphResult<()> {
        if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
            self.store.path = PathBuf::from(path.trim());
        }
        if let Some(raw) = statement_timeout_ms {
            self.store.statement_timeout_ms = raw.trim().parse().map_err(|_| {
                GraphError::Config(format!("NEXUS_STATEMENT_TIMEOUT_MS is not a number: '{raw}'"))
            })?;
        }
        self.validate()
    }

    /// Reject zero limits and timeouts.
    pub fn validate(&self) -> GraphResult<()> {
        if self.store.statement_timeout_ms == 0 {
            return Err(GraphError::Config("store.statement_timeout_ms must be > 0".into()));
        }
        if self.retrieval.anchors_per_keyword == 0 {
            return Err(GraphError::Config("retrieval.anchors_per_keyword must be > 0".into()));
        }
        if self.retrieval.neighborhood_limit == 0 {
            return Err(GraphError::Config("retrieval.neighborhood_limit must be > 0".into()));
        }
        if self.retrieval.snippet_chars == 0 {
            return Err(GraphError::Config("retrieval.snippet_chars must be > 0".into()));
        }
        Ok(())
    }
}
