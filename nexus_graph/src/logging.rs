//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup. Every component logs through `tracing`.

use tracing_subscriber::EnvFilter;

use crate::error::{GraphError, GraphResult};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (`"info"`, `"nexus_graph=debug"`, ...)
/// is used as the filter directive.
pub fn init(level: &str) -> GraphResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| GraphError::Logger(format!("invalid log level '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| GraphError::Logger(format!("failed to set subscriber: {e}")))
}
