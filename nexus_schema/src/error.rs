//! Errors raised while decoding producer output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed extraction batch: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
