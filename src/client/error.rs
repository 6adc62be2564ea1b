// ABOUTME: Error types for session operations with conversion from transport and store failures
// ABOUTME: Separates I/O, store, parameter and lifecycle failures for callers that match on them

use std::io;
use thiserror::Error;

/// Errors surfaced by the session and its handle.
#[derive(Debug, Error)]
pub enum EsmeError {
    /// I/O failure on the transport.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// The shared key-value store failed; sequence numbers and unacked
    /// bookkeeping are unavailable.
    #[error("store error: {0}")]
    Store(crate::Error),

    /// Submit parameters that cannot be turned into a PDU.
    #[error("invalid submit parameters: {0}")]
    InvalidParams(String),

    /// The session task has terminated; this handle is stale.
    #[error("session closed")]
    SessionClosed,
}

/// Result alias for session operations.
pub type EsmeResult<T> = Result<T, EsmeError>;

impl From<crate::Error> for EsmeError {
    fn from(err: crate::Error) -> Self {
        match err.downcast::<io::Error>() {
            Ok(io_err) => EsmeError::Connection(*io_err),
            Err(err) => EsmeError::Store(err),
        }
    }
}
