//! Error types for the leasing client and the reference pool.

use thiserror::Error;

/// Failures surfaced by [`crate::LeasingClient`] operations.
///
/// Every variant is recoverable: a failed call leaves the client usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaseError {
    /// The pool is at capacity for this tool. Back off or queue.
    #[error("no licenses available for '{0}'")]
    NoLicensesAvailable(String),

    /// The handle is not currently valid (already returned, detached,
    /// or issued by a different client).
    #[error("invalid license handle")]
    InvalidHandle,

    /// The exchange completed with an unexpected status code.
    #[error("unexpected HTTP status {0}")]
    Transport(u16),

    /// The exchange succeeded but the body was missing fields or unparseable.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The endpoint could not be reached or the exchange did not complete.
    #[error("connection error: {0}")]
    Connection(String),

    /// A precondition on the arguments was violated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, LeaseError>;

/// Failures raised by [`crate::pool::LicensePool`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("no licenses available for '{0}'")]
    Exhausted(String),

    #[error("unknown lease '{0}'")]
    UnknownLease(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid allocation: {0}")]
    InvalidAllocation(String),
}

impl PoolError {
    /// HTTP status code this failure is reported with on the wire.
    pub fn status_code(&self) -> u16 {
        match self {
            PoolError::UnknownTool(_) | PoolError::UnknownLease(_) => 404,
            PoolError::Exhausted(_) => 409,
            PoolError::InvalidRequest(_) | PoolError::InvalidAllocation(_) => 400,
        }
    }
}
