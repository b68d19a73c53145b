//! Query engine error types.

use thiserror::Error;
use vs_bus::BusError;

/// Errors that can occur while running a diagnostic query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("bus channel error: {0}")]
    Bus(#[from] BusError),

    #[error("malformed request: {0}")]
    Request(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Convenience alias for query results.
pub type QueryResult<T> = Result<T, QueryError>;
