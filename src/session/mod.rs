//! Client-side session lifecycle: persisted token + user view, the explicit
//! session state machine, and the provider that reconciles persisted state
//! against the server's verification endpoint.

pub mod gateway;
pub mod machine;
pub mod provider;
pub mod store;

pub use gateway::{GatewayError, HttpVerificationGateway, VerificationGateway};
pub use machine::{transition, Effect, SessionEvent, SessionState};
pub use provider::{AuthProvider, Navigation, ProviderError};
pub use store::{FileStore, MemoryStore, PersistedSession, SessionStore, StoreError};
