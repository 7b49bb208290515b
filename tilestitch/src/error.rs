//! Error types for a stitching run.

use thiserror::Error;

use crate::provider::ProviderError;

/// Result type for stitching operations.
pub type StitchResult<T> = Result<T, StitchError>;

/// Errors that can end a stitching run.
///
/// Throttled tile responses never appear here: they are retried inside the
/// owning fetch worker and only surface as [`StitchError::RetriesExhausted`]
/// when a retry ceiling has been configured.
#[derive(Debug, Error)]
pub enum StitchError {
    /// Malformed dimensions, resource identifier or configuration.
    ///
    /// Raised before any work is scheduled.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A tile kept being refused until the configured ceiling was reached.
    #[error("Tile at ({x}, {y}) still refused after {attempts} attempts")]
    RetriesExhausted { x: u32, y: u32, attempts: u32 },

    /// A transport fault a worker could not recover from.
    #[error("Worker {worker} failed: {reason}")]
    Unrecoverable { worker: usize, reason: String },

    /// Tile bytes could not be decoded as an image.
    #[error("Failed to decode tile at ({x}, {y}): {reason}")]
    Decode { x: u32, y: u32, reason: String },

    /// The results channel closed before every tile was painted.
    #[error("Reassembly incomplete: painted {painted} of {expected} tiles")]
    Incomplete { painted: usize, expected: usize },

    /// The run was cancelled before it completed.
    #[error("Run cancelled")]
    Cancelled,

    /// A worker or sink task panicked or was aborted.
    #[error("Task failed: {0}")]
    Worker(String),

    /// Image metadata could not be retrieved or parsed.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// HTTP client construction or transport error outside a worker.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl StitchError {
    /// Returns true if this error was caused by cancellation rather than a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StitchError::Cancelled)
    }
}

impl From<tokio::task::JoinError> for StitchError {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_cancelled() {
            StitchError::Cancelled
        } else {
            StitchError::Worker(e.to_string())
        }
    }
}
