//! Injectable token storage.
//!
//! DESIGN
//! ======
//! The session is two opaque strings under well-known keys. Production
//! shells persist them durably ([`FileTokenStore`], or a platform store
//! implementing [`TokenStore`] themselves); tests and short-lived tools
//! use [`MemoryTokenStore`]. All operations are synchronous and
//! internally synchronized; there is no cross-operation locking, matching
//! the single-retry-per-request recovery rule in the client.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tracing::warn;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Durable key-value storage for the session token pair.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    /// Store both tokens, replacing any existing session.
    fn set_tokens(&self, access: &str, refresh: &str);
    /// Replace only the access token (refresh exchange outcome).
    fn set_access_token(&self, access: &str);
    /// Destroy the session.
    fn clear(&self);
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
struct TokenPair {
    access: Option<String>,
    refresh: Option<String>,
}

/// In-memory store for tests and shells with their own persistence.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<TokenPair>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TokenPair> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.lock().access.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.lock().refresh.clone()
    }

    fn set_tokens(&self, access: &str, refresh: &str) {
        let mut pair = self.lock();
        pair.access = Some(access.to_string());
        pair.refresh = Some(refresh.to_string());
    }

    fn set_access_token(&self, access: &str) {
        self.lock().access = Some(access.to_string());
    }

    fn clear(&self) {
        let mut pair = self.lock();
        pair.access = None;
        pair.refresh = None;
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-file-backed store under the well-known token keys.
///
/// Writes are best-effort: persistence failures are logged, not
/// propagated, so a read-only disk degrades to an in-session-only token
/// pair rather than breaking auth flows.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Map<String, Value> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) {
        let payload = Value::Object(map.clone()).to_string();
        if let Err(e) = std::fs::write(&self.path, payload) {
            warn!(error = %e, path = %self.path.display(), "token store write failed");
        }
    }

    fn read_key(&self, key: &str) -> Option<String> {
        self.read_map().get(key).and_then(Value::as_str).map(str::to_owned)
    }
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        self.read_key(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        self.read_key(REFRESH_TOKEN_KEY)
    }

    fn set_tokens(&self, access: &str, refresh: &str) {
        let mut map = self.read_map();
        map.insert(ACCESS_TOKEN_KEY.to_string(), Value::String(access.to_string()));
        map.insert(REFRESH_TOKEN_KEY.to_string(), Value::String(refresh.to_string()));
        self.write_map(&map);
    }

    fn set_access_token(&self, access: &str) {
        let mut map = self.read_map();
        map.insert(ACCESS_TOKEN_KEY.to_string(), Value::String(access.to_string()));
        self.write_map(&map);
    }

    fn clear(&self) {
        let mut map = self.read_map();
        map.remove(ACCESS_TOKEN_KEY);
        map.remove(REFRESH_TOKEN_KEY);
        self.write_map(&map);
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
