//! # Nexus Graph
//!
//! The engine of the knowledge-graph pipeline. Extraction batches described by
//! `nexus_schema` are merged into a persistent property graph partitioned by
//! session, and free-text keywords are turned back into a bounded context.
//!
//! ## Core Components
//!
//! - **knowledge_base**: The SQLite-backed graph store, its merge and read statements
//! - **ingestion**: Applies extraction batches, entities before relationships
//! - **context_assembler**: Anchor search, one-hop expansion and rendering
//! - **config** / **logging**: TOML configuration and `tracing` setup
//!
//! ## Design Philosophy
//!
//! - **Idempotent**: Writes merge on identity, so replaying a batch changes nothing
//! - **Isolated**: Every read and write is scoped to one session
//! - **Bounded**: Anchor and neighborhood limits keep contexts small

pub mod config;
pub mod context_assembler;
pub mod error;
pub mod ingestion;
pub mod knowledge_base;
pub mod logging;

pub use config::*;
pub use context_assembler::*;
pub use error::*;
pub use ingestion::*;
pub use knowledge_base::*;
