use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::user::UserView;
use crate::session::gateway::VerificationGateway;
use crate::session::machine::{transition, Effect, SessionEvent, SessionState};
use crate::session::store::{PersistedSession, SessionStore};

#[derive(Debug, PartialEq, Eq)]
pub enum Navigation {
    SignIn,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    // Only reachable if a previous caller panicked mid-transition; the UI
    // treats it as the "please reload" terminal state.
    #[error("session state lock poisoned")]
    Poisoned,
}

/// Holds the current session state and keeps it in sync with storage and the
/// server. Single writer by design; overlapping verifications are fenced with
/// a generation counter so a late-resolving stale result cannot overwrite a
/// newer state.
pub struct AuthProvider {
    state: Mutex<SessionState>,
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn VerificationGateway>,
    generation: AtomicU64,
}

impl AuthProvider {
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<dyn VerificationGateway>) -> Self {
        AuthProvider {
            state: Mutex::new(SessionState::Uninitialized),
            store,
            gateway,
            generation: AtomicU64::new(0),
        }
    }

    pub fn user(&self) -> Option<UserView> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.credentials().map(|(_, user)| user.clone()))
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.credentials().map(|(token, _)| token.to_string()))
    }

    pub fn is_loading(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.is_loading())
            .unwrap_or(false)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .lock()
            .map(|state| matches!(&*state, SessionState::Authenticated { .. }))
            .unwrap_or(false)
    }

    /// Mount-time load: restore whatever storage holds, then reconcile it
    /// against the server. Authoritative overwrite on success, full clear on
    /// rejection, optimistic retention when the server is unreachable.
    pub async fn initialize(&self) -> Result<(), ProviderError> {
        let generation = self.next_generation();
        let restored = PersistedSession::load(self.store.as_ref());
        self.reconcile(generation, restored).await
    }

    /// Re-runs verification for the current session (e.g. after a
    /// subscription change) without touching the rest of the lifecycle.
    pub async fn refresh_user(&self) -> Result<(), ProviderError> {
        let generation = self.next_generation();

        let in_memory = {
            let guard = self.state.lock().map_err(|_| ProviderError::Poisoned)?;
            guard.credentials().map(|(token, user)| PersistedSession {
                token: token.to_string(),
                user: user.clone(),
            })
        };
        let restored = in_memory.or_else(|| PersistedSession::load(self.store.as_ref()));

        self.reconcile(generation, restored).await
    }

    /// Installs freshly issued credentials from a sign-in or sign-up flow.
    /// Invalidates any in-flight verification.
    pub fn set_auth_state(&self, token: String, user: UserView) -> Result<(), ProviderError> {
        let generation = self.next_generation();
        self.apply(generation, SessionEvent::SignedIn { token, user })?;
        Ok(())
    }

    /// Clears memory and storage unconditionally and tells the caller where
    /// to send the user.
    pub fn sign_out(&self) -> Result<Navigation, ProviderError> {
        let generation = self.next_generation();
        self.apply(generation, SessionEvent::SignedOut)?;
        Ok(Navigation::SignIn)
    }

    async fn reconcile(
        &self,
        generation: u64,
        restored: Option<PersistedSession>,
    ) -> Result<(), ProviderError> {
        let session = match restored {
            Some(session) => session,
            None => {
                self.apply(generation, SessionEvent::NothingRestored)?;
                return Ok(());
            }
        };

        self.apply(
            generation,
            SessionEvent::Restored {
                token: session.token.clone(),
                user: session.user,
            },
        )?;

        let event = match self.gateway.verify_token(&session.token).await {
            Ok(Some(user)) => SessionEvent::Confirmed { user },
            Ok(None) => SessionEvent::Rejected,
            Err(e) => {
                warn!("Verification unreachable, retaining stored session: {e}");
                SessionEvent::Unreachable
            }
        };
        self.apply(generation, event)?;
        Ok(())
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies an event unless a newer operation has started since
    /// `generation` was taken. Storage effects run under the state lock so a
    /// concurrent apply cannot interleave between the state write and its
    /// persistence.
    fn apply(&self, generation: u64, event: SessionEvent) -> Result<bool, ProviderError> {
        let mut guard = self.state.lock().map_err(|_| ProviderError::Poisoned)?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale session event: {event:?}");
            return Ok(false);
        }

        let current = std::mem::replace(&mut *guard, SessionState::Uninitialized);
        let (next, effects) = transition(current, event);
        *guard = next;

        for effect in effects {
            match effect {
                Effect::Persist { token, user } => {
                    PersistedSession::save(self.store.as_ref(), &token, &user);
                }
                Effect::ClearStorage => PersistedSession::clear(self.store.as_ref()),
                Effect::NavigateToSignIn => {}
            }
        }

        Ok(true)
    }
}
