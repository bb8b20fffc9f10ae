//! Per-request authentication state machine.
//!
//! Transitions are pure: [`AuthState::apply`] returns the next state and the
//! effect the caller has to perform on the session. Nothing here touches
//! the network or the store.

use thiserror::Error;
use uuid::Uuid;

pub const LOGIN_FAILED: &str = "Password or username is incorrect";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated { user_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Credentials submitted (login or registration).
    Submit,
    CredentialsVerified { user_id: Uuid },
    CredentialsRejected,
    /// The session's identity no longer resolves to a user.
    IdentityLost,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEffect {
    /// Regenerate the session and store the identity in it.
    EstablishSession { user_id: Uuid },
    /// Drop the identity and regenerate the session.
    EndSession,
    /// Drop the identity, keep the session.
    ClearIdentity,
    FlashError(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: AuthState,
    pub effect: Option<AuthEffect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event {event:?} is not valid in state {state:?}")]
pub struct InvalidTransition {
    pub state: AuthState,
    pub event: AuthEvent,
}

impl AuthState {
    /// State implied by the identity serialized in a session.
    pub fn from_session(user_id: Option<Uuid>) -> Self {
        match user_id {
            Some(user_id) => Self::Authenticated { user_id },
            None => Self::Anonymous,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::Authenticated { user_id } => Some(*user_id),
            _ => None,
        }
    }

    pub fn apply(self, event: AuthEvent) -> Result<Transition, InvalidTransition> {
        use AuthEvent::*;
        use AuthState::*;

        let (next, effect) = match (self, event) {
            (Anonymous | Authenticated { .. }, Submit) => (Authenticating, None),
            (Authenticating, CredentialsVerified { user_id }) => (
                Authenticated { user_id },
                Some(AuthEffect::EstablishSession { user_id }),
            ),
            (Authenticating, CredentialsRejected) => {
                (Anonymous, Some(AuthEffect::FlashError(LOGIN_FAILED)))
            }
            (Authenticated { .. }, IdentityLost) => (Anonymous, Some(AuthEffect::ClearIdentity)),
            (Authenticated { .. }, Logout) => (Anonymous, Some(AuthEffect::EndSession)),
            (Anonymous, Logout) => (Anonymous, None),
            (state, event) => return Err(InvalidTransition { state, event }),
        };

        Ok(Transition { next, effect })
    }
}
