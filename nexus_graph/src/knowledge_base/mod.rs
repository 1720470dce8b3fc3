//! Knowledge Base module - the persistent, session-partitioned property graph.
//!
//! The graph consists of:
//! - **Entities**: nodes keyed by `(kind, name, session_id)`
//! - **Relationships**: directed, typed edges between entities of one session
//! - **Tags**: `session_id` on everything, `query_id` on tagged writes

mod graph;
mod raw;
mod records;
mod statements;

pub use graph::*;
pub use raw::{Params, Record};
pub use records::*;
