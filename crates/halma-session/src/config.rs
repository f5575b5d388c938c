//! Session configuration and lifecycle state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings shared by every session a server spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capacity of the session's inbound command channel. Reader tasks
    /// wait when it is full, so a flooding client cannot grow memory.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { command_buffer: 64 }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of a match session.
///
/// Transitions are strictly ordered:
///
/// ```text
/// WaitingStart → InProgress → Ended
/// ```
///
/// - **WaitingStart**: both players are seated but nobody has been told
///   yet.
/// - **InProgress**: moves, chat and forfeits are processed.
/// - **Ended**: an outcome was decided. Every further request is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    WaitingStart,
    InProgress,
    Ended,
}

impl SessionState {
    /// Returns `true` while requests from players are processed.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns `true` once an outcome has been decided.
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Returns the state that follows this one, or `None` from `Ended`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::WaitingStart => Some(Self::InProgress),
            Self::InProgress => Some(Self::Ended),
            Self::Ended => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingStart => write!(f, "WaitingStart"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_next_follows_strict_order() {
        assert_eq!(
            SessionState::WaitingStart.next(),
            Some(SessionState::InProgress)
        );
        assert_eq!(SessionState::InProgress.next(), Some(SessionState::Ended));
        assert_eq!(SessionState::Ended.next(), None);
    }

    #[test]
    fn test_session_state_cannot_skip_or_go_back() {
        assert!(
            !SessionState::WaitingStart.can_transition_to(SessionState::Ended)
        );
        assert!(
            !SessionState::Ended.can_transition_to(SessionState::InProgress)
        );
        assert!(
            SessionState::InProgress.can_transition_to(SessionState::Ended)
        );
    }

    #[test]
    fn test_session_state_flags() {
        assert!(!SessionState::WaitingStart.is_active());
        assert!(SessionState::InProgress.is_active());
        assert!(!SessionState::Ended.is_active());
        assert!(SessionState::Ended.is_ended());
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::WaitingStart.to_string(), "WaitingStart");
        assert_eq!(SessionState::Ended.to_string(), "Ended");
    }

    #[test]
    fn test_session_config_default() {
        assert_eq!(SessionConfig::default().command_buffer, 64);
    }
}
