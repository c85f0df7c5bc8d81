//! Session identity and lifecycle state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SessionError;

/// Identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendered as 32 lowercase hex digits, the form used in the endpoint URL.
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SessionError::InvalidId(s.to_string()))
    }
}

/// Lifecycle of a session.
///
/// `Connecting → Ready → Closing → Closed`, where a session may also go
/// straight from `Connecting` to `Closing` if the client leaves before
/// finishing the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Stream open, handshake not finished.
    Connecting,
    /// Handshake finished; tool calls are accepted.
    Ready,
    /// Disconnect or shutdown seen; waiting for in-flight calls.
    Closing,
    /// Transport handle released.
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Ready) | (Connecting, Closing) | (Ready, Closing) | (Closing, Closed)
        )
    }

    /// Whether the session still accepts frames.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Connecting | Self::Ready)
    }

    /// Whether tool requests are accepted.
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use SessionState::*;
        assert!(Connecting.can_transition_to(Ready));
        assert!(Connecting.can_transition_to(Closing));
        assert!(Ready.can_transition_to(Closing));
        assert!(Closing.can_transition_to(Closed));
    }

    #[test]
    fn test_illegal_transitions() {
        use SessionState::*;
        assert!(!Ready.can_transition_to(Connecting));
        assert!(!Ready.can_transition_to(Ready));
        assert!(!Connecting.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Ready));
        assert!(!Closing.can_transition_to(Ready));
    }

    #[test]
    fn test_session_id_round_trip() {
        let id = SessionId::new();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 32);
        assert!(!rendered.contains('-'));
        assert_eq!(rendered.parse::<SessionId>().unwrap(), id);
    }

    #[test]
    fn test_session_id_rejects_garbage() {
        assert!(matches!(
            "not-a-session".parse::<SessionId>(),
            Err(SessionError::InvalidId(_))
        ));
    }
}
