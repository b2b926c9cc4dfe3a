//! Session ownership.
//!
//! [`SessionStore`] is the single owner of the stored credential. It is
//! initialised from the persisted store at startup and torn down on logout or
//! on any unauthorized response. Observers follow changes through
//! [`SessionStore::subscribe`].

pub mod store;

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

use crate::de;
use crate::error::{PortalError, Result};

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Store key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Store key holding the serialized user summary.
pub const USER_KEY: &str = "user";

/// Cached identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(
        default,
        deserialize_with = "de::optional_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub passout_year: Option<i32>,

    /// Remaining backend fields, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserSummary {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// Snapshot of the client session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserSummary>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Process-wide owner of the persisted session.
pub struct SessionStore {
    store: Mutex<Box<dyn KeyValueStore>>,
    state_tx: watch::Sender<Session>,
}

impl SessionStore {
    /// Wrap a key/value store, reading any persisted session.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        let store: Box<dyn KeyValueStore> = Box::new(store);
        let initial = read_session(store.as_ref());
        let (state_tx, _) = watch::channel(initial);

        Self {
            store: Mutex::new(store),
            state_tx,
        }
    }

    /// Session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Persisted bearer token, if any.
    pub fn get_token(&self) -> Option<String> {
        read_token(self.lock().as_ref())
    }

    /// Persisted user summary. Never returned without a token.
    pub fn get_user(&self) -> Option<UserSummary> {
        let store = self.lock();
        read_token(store.as_ref())?;
        read_user(store.as_ref())
    }

    /// Current session snapshot.
    pub fn current(&self) -> Session {
        read_session(self.lock().as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }

    /// Persist a freshly issued session.
    pub fn establish(&self, token: &str, user: &UserSummary) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PortalError::Store(
                "refusing to store an empty token".to_string(),
            ));
        }
        let user_json = serde_json::to_string(user)?;

        let mut store = self.lock();
        let previous_token = store.get(TOKEN_KEY);

        // Token first so a user record never exists without one.
        store.set(TOKEN_KEY, token)?;
        if let Err(e) = store.set(USER_KEY, &user_json) {
            let rollback = match &previous_token {
                Some(previous) => store.set(TOKEN_KEY, previous),
                None => store.remove(TOKEN_KEY),
            };
            if let Err(rollback_err) = rollback {
                tracing::warn!(error = %rollback_err, "Failed to restore previous token");
            }
            return Err(e);
        }

        self.state_tx.send_replace(Session {
            token: Some(token.to_string()),
            user: Some(user.clone()),
        });

        tracing::info!(user_id = %user.id, email = %user.email, "Session established");
        Ok(())
    }

    /// Remove the persisted token and user.
    ///
    /// Returns `true` if a session existed. Calling it without a session is a
    /// no-op, so concurrent callers clear at most once.
    pub fn clear_session(&self) -> bool {
        let mut store = self.lock();

        let had_session = store.get(TOKEN_KEY).is_some() || store.get(USER_KEY).is_some();
        if !had_session {
            return false;
        }

        if let Err(e) = store.remove(USER_KEY) {
            tracing::warn!(error = %e, "Failed to remove persisted user");
        }
        if let Err(e) = store.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "Failed to remove persisted token");
        }

        self.state_tx.send_replace(Session::default());

        tracing::info!("Session cleared");
        true
    }

    /// Follow session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state_tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn KeyValueStore>> {
        // A poisoned lock still guards a consistent map.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn read_token(store: &dyn KeyValueStore) -> Option<String> {
    store
        .get(TOKEN_KEY)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn read_user(store: &dyn KeyValueStore) -> Option<UserSummary> {
    let raw = store.get(USER_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::debug!(error = %e, "Stored user record unparseable");
            None
        }
    }
}

fn read_session(store: &dyn KeyValueStore) -> Session {
    match read_token(store) {
        Some(token) => Session {
            token: Some(token),
            user: read_user(store),
        },
        None => Session::default(),
    }
}
