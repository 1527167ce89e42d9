//! Error types for free/busy reconciliation.

use thiserror::Error;

/// Failures raised by a remote collaborator (free/busy server, appointment
/// store, or directory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request reached the remote system but failed (HTTP error, bad payload, ...).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The remote system did not answer in time.
    #[error("Request timed out")]
    Timeout,

    /// The fetch was abandoned before it produced a result.
    #[error("Request cancelled")]
    Cancelled,
}

/// Errors surfaced by the reconciliation entry points.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),

    /// The free/busy or directory fetch failed; the whole call is aborted.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No directory configured for user search")]
    NoDirectory,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
