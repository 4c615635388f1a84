//! Session data structure and lifecycle state machine
//!
//! ```text
//! Created
//!   ↓ first capture or projection
//! Active
//!   ↓ context closed
//! Closing
//!   ↓ store and rule cleaned up
//! Gone
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::{ContextId, SessionId};
use crate::error::SessionError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Created,
    Active,
    Closing,
    Gone,
}

impl SessionState {
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        match (self, target) {
            (SessionState::Created, SessionState::Active) => true,
            (SessionState::Created, SessionState::Closing) => true,
            (SessionState::Active, SessionState::Closing) => true,
            (SessionState::Closing, SessionState::Gone) => true,
            // Nothing leaves Gone, not even a no-op
            (SessionState::Gone, _) => false,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Gone => "gone",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Context this session is bound to
    pub context: ContextId,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
    /// Credentials captured so far
    pub captured: usize,
}

impl Session {
    pub fn new(context: ContextId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::derive(context, created_at),
            context,
            created_at,
            state: SessionState::Created,
            captured: 0,
        }
    }

    pub fn transition_to(&mut self, new_state: SessionState) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        if self.state != new_state {
            tracing::debug!(
                session = %self.id,
                from = %self.state,
                to = %new_state,
                "Session state transition"
            );
        }

        self.state = new_state;
        Ok(())
    }
}
