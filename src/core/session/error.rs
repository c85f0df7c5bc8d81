//! Session error types.

use thiserror::Error;

use super::state::SessionState;

/// Errors raised by the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session id could not be parsed.
    #[error("Invalid session ID: {0}")]
    InvalidId(String),

    /// No session with this id exists.
    #[error("Could not find session: {0}")]
    NotFound(String),

    /// The session no longer accepts frames.
    #[error("Session {0} is closed")]
    Closed(String),

    /// A lifecycle transition that the state machine does not allow.
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    /// Writing to the session's event stream failed.
    #[error(transparent)]
    Transport(#[from] crate::core::transport::TransportError),
}
