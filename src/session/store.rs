use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::user::UserView;

/// Storage key for the raw token string.
pub const TOKEN_KEY: &str = "prepdeck_token";
/// Storage key for the JSON-serialized user view.
pub const USER_KEY: &str = "prepdeck_user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value could not be encoded: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Two-entry string store mirroring browser local storage. Implementations
/// may fail (storage disabled, disk gone); callers treat every failure as
/// "no persisted session" and carry on.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// The persisted half of the session: raw token plus the last known user
/// view. Loading is best-effort; a half-written or unreadable pair counts as
/// absent so token and user can never be restored separately.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSession {
    pub token: String,
    pub user: UserView,
}

impl PersistedSession {
    pub fn load(store: &dyn SessionStore) -> Option<PersistedSession> {
        let token = match store.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return None,
            Err(e) => {
                debug!("Session storage unreadable, treating as signed out: {e}");
                return None;
            }
        };

        let raw_user = match store.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!("Session storage unreadable, treating as signed out: {e}");
                return None;
            }
        };

        match serde_json::from_str::<UserView>(&raw_user) {
            Ok(user) => Some(PersistedSession { token, user }),
            Err(e) => {
                debug!("Discarding unparseable persisted user: {e}");
                None
            }
        }
    }

    pub fn save(store: &dyn SessionStore, token: &str, user: &UserView) {
        let encoded = match serde_json::to_string(user) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Could not encode user for persistence: {e}");
                return;
            }
        };
        if let Err(e) = store.set(TOKEN_KEY, token) {
            warn!("Could not persist session token: {e}");
            return;
        }
        if let Err(e) = store.set(USER_KEY, &encoded) {
            warn!("Could not persist session user: {e}");
        }
    }

    pub fn clear(store: &dyn SessionStore) {
        if let Err(e) = store.remove(TOKEN_KEY) {
            warn!("Could not remove persisted token: {e}");
        }
        if let Err(e) = store.remove(USER_KEY) {
            warn!("Could not remove persisted user: {e}");
        }
    }
}

/// Process-local store, used in tests and anywhere persistence across
/// restarts is not wanted.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Stores entries as a JSON object on disk. A missing file reads as empty.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles; there is no concurrent writer by
    // design, but two provider calls on different tasks must not interleave.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        fs::write(&self.path, serde_json::to_string(entries)?)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        let mut entries = self.read_entries()?;
        entries.remove(key);
        self.write_entries(&entries)
    }
}
