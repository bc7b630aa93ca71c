//! Durable session storage for the credential pair.
//!
//! The web client kept tokens in `localStorage` under three historical
//! access-token keys. This module keeps the same key contract behind an
//! injected `KeyValueStore` so the request layer never touches ambient
//! global state: `MemoryStore` for tests, `FileStore` (JSON map on disk)
//! for real sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::api::types::{AuthResponse, User};

/// Current access-token key.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Legacy access-token aliases, read in this order after the current key.
/// This fallback order is a compatibility contract with older sessions.
pub const LEGACY_TOKEN_KEYS: [&str; 2] = ["auth_token", "token"];

/// Refresh-token key.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Serialized user object key.
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session file: {0}")]
    Read(std::io::Error),
    #[error("session file is not valid JSON: {0}")]
    Parse(serde_json::Error),
}

/// Minimal key-value contract the session layer is written against.
///
/// Writes are best-effort: the web client swallowed `localStorage` write
/// failures, and persisting a token is never worth failing a request over.
/// Implementations log and continue when the backing store is unwritable.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and short-lived embedders.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }
}

/// Durable store backed by a flat JSON object on disk.
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(SessionError::Parse)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(SessionError::Read(e)),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Default session path: `<config dir>/kolesa/session.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kolesa")
            .join("session.json")
    }

    fn persist(&self, values: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Failed to create session directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(values) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    log::warn!("Failed to persist session file: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to serialize session: {}", e),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
            self.persist(&values);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
            self.persist(&values);
        }
    }
}

/// Session-state object handed to the request layer.
///
/// Cheap to clone; all clones share the same underlying store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// In-memory session, mainly for tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Resolve the current access token: the current key first, then the
    /// legacy aliases in order. Empty values are skipped.
    pub fn access_token(&self) -> Option<String> {
        std::iter::once(ACCESS_TOKEN_KEY)
            .chain(LEGACY_TOKEN_KEYS)
            .filter_map(|key| self.store.get(key))
            .find(|token| !token.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store
            .get(REFRESH_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    /// Persist a credential pair, keeping the legacy alias in sync the way
    /// the web client did on every sign-in and refresh.
    pub fn store_tokens(&self, access_token: &str, refresh_token: &str) {
        self.store.set(ACCESS_TOKEN_KEY, access_token);
        self.store.set(REFRESH_TOKEN_KEY, refresh_token);
        self.store.set(LEGACY_TOKEN_KEYS[0], access_token);
    }

    /// Persist the full auth response (tokens plus the user object).
    pub fn store_auth(&self, auth: &AuthResponse) {
        self.store_tokens(&auth.access_token, &auth.refresh_token);
        match serde_json::to_string(&auth.user) {
            Ok(json) => self.store.set(USER_KEY, &json),
            Err(e) => log::warn!("Failed to serialize user for session: {}", e),
        }
    }

    /// The stored user object, if any.
    pub fn user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    /// Remove every session key. Called on logout and on refresh failure
    /// cleanup paths that invalidate the whole session.
    pub fn clear(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        for key in LEGACY_TOKEN_KEYS {
            self.store.remove(key);
        }
        self.store.remove(REFRESH_TOKEN_KEY);
        self.store.remove(USER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            username: Some("driver".to_string()),
            email: Some("driver@example.com".to_string()),
            first_name: None,
            last_name: None,
            avatar_url: None,
            is_seller: Some(false),
            role: None,
        }
    }

    #[test]
    fn access_token_prefers_current_key() {
        let session = SessionStore::in_memory();
        session.store.set("token", "oldest");
        session.store.set("auth_token", "older");
        session.store.set("access_token", "current");
        assert_eq!(session.access_token().as_deref(), Some("current"));
    }

    #[test]
    fn access_token_falls_back_through_legacy_keys_in_order() {
        let session = SessionStore::in_memory();
        session.store.set("token", "oldest");
        assert_eq!(session.access_token().as_deref(), Some("oldest"));

        session.store.set("auth_token", "older");
        assert_eq!(session.access_token().as_deref(), Some("older"));
    }

    #[test]
    fn access_token_skips_empty_values() {
        let session = SessionStore::in_memory();
        session.store.set("access_token", "");
        session.store.set("auth_token", "fallback");
        assert_eq!(session.access_token().as_deref(), Some("fallback"));
    }

    #[test]
    fn store_tokens_writes_legacy_alias() {
        let session = SessionStore::in_memory();
        session.store_tokens("acc", "ref");
        assert_eq!(session.store.get("access_token").as_deref(), Some("acc"));
        assert_eq!(session.store.get("auth_token").as_deref(), Some("acc"));
        assert_eq!(session.store.get("refresh_token").as_deref(), Some("ref"));
    }

    #[test]
    fn clear_removes_all_keys() {
        let session = SessionStore::in_memory();
        let auth = AuthResponse {
            access_token: "acc".to_string(),
            refresh_token: "ref".to_string(),
            user: user(),
        };
        session.store_auth(&auth);
        session.store.set("token", "stale");

        session.clear();
        assert!(session.access_token().is_none());
        assert!(session.refresh_token().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("access_token", "persisted");
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("access_token").as_deref(), Some("persisted"));
        store.remove("access_token");

        let store = FileStore::open(&path).unwrap();
        assert!(store.get("access_token").is_none());
    }
}
