//! Error taxonomy for the graph engine.
//!
//! None of these escape the component that detects them during ingestion or
//! retrieval; they are logged and turned into skipped records, zero counts or
//! a degraded context string. Only configuration and logger setup surface to
//! the embedding process.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("constraint setup failed for {label}: {reason}")]
    ConstraintSetup { label: &'static str, reason: String },

    #[error("upsert failed for {record}: {reason}")]
    Upsert { record: String, reason: String },

    #[error("graph backend unavailable: {0}")]
    Connectivity(String),

    #[error("statement exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("query error: {0}")]
    Query(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// Backend unreachable or too slow, as opposed to a bad record.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, GraphError::Connectivity(_) | GraphError::Timeout(_))
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Classify a driver error raised while running a statement.
pub(crate) fn from_sqlite(err: rusqlite::Error, deadline: Duration) -> GraphError {
    use rusqlite::ErrorCode;

    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::OperationInterrupted => GraphError::Timeout(deadline),
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt => GraphError::Connectivity(err.to_string()),
            _ => GraphError::Query(err.to_string()),
        },
        _ => GraphError::Query(err.to_string()),
    }
}
