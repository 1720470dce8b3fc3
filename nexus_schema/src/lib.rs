//! # Nexus Schema
//!
//! The data model crate - every entity kind, the relationship record, the
//! extraction batch handed over by the extraction producer, and the tags that
//! partition the shared graph into sessions and queries.
//! This crate knows nothing about storage and performs no I/O.

pub mod entities;
pub mod error;
pub mod extraction;
pub mod relationship;
pub mod tags;

pub use entities::*;
pub use error::*;
pub use extraction::*;
pub use relationship::*;
pub use tags::*;
