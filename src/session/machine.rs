use crate::models::user::UserView;

/// Session lifecycle. `Loading` always carries the credentials being
/// reconciled; with nothing persisted the machine goes straight to
/// `Unauthenticated`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Uninitialized,
    Loading { token: String, user: UserView },
    Authenticated { token: String, user: UserView },
    Unauthenticated,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            SessionState::Uninitialized | SessionState::Loading { .. }
        )
    }

    pub fn credentials(&self) -> Option<(&str, &UserView)> {
        match self {
            SessionState::Authenticated { token, user }
            | SessionState::Loading { token, user } => Some((token.as_str(), user)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A persisted token + user pair was read back from storage.
    Restored { token: String, user: UserView },
    /// Storage held no usable session.
    NothingRestored,
    /// The server confirmed the token and returned the authoritative user.
    Confirmed { user: UserView },
    /// The server explicitly rejected the token (invalid, expired, or the
    /// account is gone).
    Rejected,
    /// The verification call itself failed (network, server down). Not a
    /// rejection: a transient outage must not evict a valid session.
    Unreachable,
    /// Sign-in or sign-up handed over freshly issued credentials.
    SignedIn { token: String, user: UserView },
    /// The user asked to sign out.
    SignedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Persist { token: String, user: UserView },
    ClearStorage,
    NavigateToSignIn,
}

/// Pure transition function. Verification outcomes only apply while
/// `Loading`; anywhere else they are stale and ignored.
pub fn transition(state: SessionState, event: SessionEvent) -> (SessionState, Vec<Effect>) {
    match (state, event) {
        (_, SessionEvent::Restored { token, user }) => {
            (SessionState::Loading { token, user }, vec![])
        }
        (_, SessionEvent::NothingRestored) => {
            (SessionState::Unauthenticated, vec![Effect::ClearStorage])
        }

        (SessionState::Loading { token, .. }, SessionEvent::Confirmed { user }) => {
            let user = user.normalized();
            let effects = vec![Effect::Persist {
                token: token.clone(),
                user: user.clone(),
            }];
            (SessionState::Authenticated { token, user }, effects)
        }
        (SessionState::Loading { .. }, SessionEvent::Rejected) => {
            (SessionState::Unauthenticated, vec![Effect::ClearStorage])
        }
        // Availability over strict consistency: keep the last known user
        // rather than forcing a sign-out over a transient failure.
        (SessionState::Loading { token, user }, SessionEvent::Unreachable) => {
            (SessionState::Authenticated { token, user }, vec![])
        }

        (_, SessionEvent::SignedIn { token, user }) => {
            let user = user.normalized();
            let effects = vec![Effect::Persist {
                token: token.clone(),
                user: user.clone(),
            }];
            (SessionState::Authenticated { token, user }, effects)
        }
        (_, SessionEvent::SignedOut) => (
            SessionState::Unauthenticated,
            vec![Effect::ClearStorage, Effect::NavigateToSignIn],
        ),

        // Stale verification outcome, nothing to do.
        (state, SessionEvent::Confirmed { .. })
        | (state, SessionEvent::Rejected)
        | (state, SessionEvent::Unreachable) => (state, vec![]),
    }
}
