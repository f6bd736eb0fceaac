// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Secure-side session state machine with typed state transitions.
//!
//! Implements the session lifecycle: Uninitialized → KeyReady (→ KeyReady) → Closed.
//! Invalid transitions result in StateTransitionError.

use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;

/// Secure-domain session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Session open, no key prepared yet. `Process` is rejected.
    Uninitialized,

    /// A cipher session is bound and `Process` may run.
    KeyReady,

    /// Session closed; nothing further is accepted.
    Closed,
}

impl SessionState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::KeyReady => "KeyReady",
            Self::Closed => "Closed",
        }
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        matches!(
            (self, target),
            (Self::Uninitialized, Self::KeyReady) |
            (Self::Uninitialized, Self::Closed) |
            // Repeated PrepareKey replaces the cipher session
            (Self::KeyReady, Self::KeyReady) |
            (Self::KeyReady, Self::Closed)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for one secure-domain session.
#[derive(Debug)]
pub struct SessionStateMachine {
    session_id: u32,
    current_state: SessionState,
    transition_count: u64,
}

impl SessionStateMachine {
    pub fn new(session_id: u32) -> Self {
        Self {
            session_id,
            current_state: SessionState::Uninitialized,
            transition_count: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.current_state
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: SessionState) -> Result<(), StateTransitionError> {
        if !self.current_state.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                session_id: self.session_id,
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        tracing::debug!(
            session_id = self.session_id,
            from = self.current_state.name(),
            to = target.name(),
            "State transition"
        );

        self.current_state = target;
        self.transition_count += 1;

        Ok(())
    }

    /// Drop back to `Uninitialized` after a failure that left no key bound.
    pub fn reset(&mut self) {
        if self.current_state != SessionState::Closed {
            self.current_state = SessionState::Uninitialized;
        }
    }

    /// Check if `Process` may run.
    pub fn is_key_ready(&self) -> bool {
        matches!(self.current_state, SessionState::KeyReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let sm = SessionStateMachine::new(1);
        assert_eq!(sm.state(), SessionState::Uninitialized);
        assert_eq!(sm.transition_count(), 0);
        assert!(!sm.is_key_ready());
    }

    #[test]
    fn test_valid_transitions() {
        let mut sm = SessionStateMachine::new(1);

        assert!(sm.transition_to(SessionState::KeyReady).is_ok());
        assert!(sm.is_key_ready());

        // Self-loop on repeated key preparation
        assert!(sm.transition_to(SessionState::KeyReady).is_ok());
        assert_eq!(sm.transition_count(), 2);

        assert!(sm.transition_to(SessionState::Closed).is_ok());
        assert_eq!(sm.state(), SessionState::Closed);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sm = SessionStateMachine::new(1);
        assert!(sm.transition_to(SessionState::Uninitialized).is_err());

        sm.transition_to(SessionState::Closed).unwrap();
        assert!(sm.transition_to(SessionState::KeyReady).is_err());
        assert_eq!(sm.state(), SessionState::Closed);
    }

    #[test]
    fn test_reset_keeps_closed() {
        let mut sm = SessionStateMachine::new(1);
        sm.transition_to(SessionState::KeyReady).unwrap();
        sm.reset();
        assert_eq!(sm.state(), SessionState::Uninitialized);

        sm.transition_to(SessionState::Closed).unwrap();
        sm.reset();
        assert_eq!(sm.state(), SessionState::Closed);
    }
}
