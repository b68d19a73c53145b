//! Bus channel error types.

use thiserror::Error;

/// Errors that can occur on a bus channel.
#[derive(Debug, Error)]
pub enum BusError {
    /// The hub and every publisher handle were dropped.
    #[error("bus channel closed")]
    Closed,
}

/// Convenience alias for bus channel results.
pub type BusResult<T> = Result<T, BusError>;
