//! Persistence of cached tokens and device secrets (spec §4.4:
//! "TokenStore"). The teacher is a pure protocol library with no
//! persistence layer; this module is new, grounded on spec §9's design
//! note ("reimplement as an injected `TokenStore` trait/interface with a
//! default filesystem backing") in place of the original's module-local
//! `new LocalStorage('/tmp/storage')`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AuthError, Result};

/// String-keyed persistence for tokens and device secrets. Implementations
/// must be idempotent on `set`/`remove` and serialize mutations for a given
/// `(client_id, username)` pair (spec §5: "Shared resources").
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Deterministic key schema (spec §4.4), shared by every `TokenStore`
/// backing.
pub struct TokenKeys;

impl TokenKeys {
    fn prefix(client_id: &str, username: &str) -> String {
        format!("CognitoIdentityServiceProvider.{client_id}.{username}")
    }

    pub fn id_token(client_id: &str, username: &str) -> String {
        format!("{}.idToken", Self::prefix(client_id, username))
    }

    pub fn access_token(client_id: &str, username: &str) -> String {
        format!("{}.accessToken", Self::prefix(client_id, username))
    }

    pub fn refresh_token(client_id: &str, username: &str) -> String {
        format!("{}.refreshToken", Self::prefix(client_id, username))
    }

    pub fn last_auth_user(client_id: &str) -> String {
        format!("CognitoIdentityServiceProvider.{client_id}.LastAuthUser")
    }

    pub fn device_key(client_id: &str, username: &str) -> String {
        format!("{}.deviceKey", Self::prefix(client_id, username))
    }

    pub fn device_group_key(client_id: &str, username: &str) -> String {
        format!("{}.deviceGroupKey", Self::prefix(client_id, username))
    }

    pub fn random_password_key(client_id: &str, username: &str) -> String {
        format!("{}.randomPasswordKey", Self::prefix(client_id, username))
    }
}

/// In-memory backing (`Mutex<HashMap>`) — the default for tests, per
/// spec §9: "tests inject an in-memory store."
#[derive(Default)]
pub struct InMemoryTokenStore {
    data: Mutex<HashMap<String, String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().expect("token store mutex poisoned").get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .lock()
            .expect("token store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.lock().expect("token store mutex poisoned").remove(key);
        Ok(())
    }
}

/// Default filesystem backing: a JSON-serialized map at a caller-supplied
/// path, replacing the original's hard-coded `/tmp/storage` (spec §9).
pub struct FileTokenStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = Self::load(&path)?;
        Ok(Self { path, cache: Mutex::new(cache) })
    }

    fn load(path: &Path) -> Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthError::corruption(format!("could not read token store file: {e}")))?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| AuthError::corruption(format!("could not parse token store file: {e}")))
    }

    fn flush(&self, data: &HashMap<String, String>) -> Result<()> {
        let serialized = serde_json::to_string(data)
            .map_err(|e| AuthError::corruption(format!("could not serialize token store: {e}")))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuthError::corruption(format!("could not create token store dir: {e}")))?;
        }
        std::fs::write(&self.path, serialized)
            .map_err(|e| AuthError::corruption(format!("could not write token store file: {e}")))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.lock().expect("token store mutex poisoned").get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.cache.lock().expect("token store mutex poisoned");
        data.insert(key.to_string(), value.to_string());
        self.flush(&data)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut data = self.cache.lock().expect("token store mutex poisoned");
        data.remove(key);
        self.flush(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_is_idempotent() {
        let store = InMemoryTokenStore::new();
        store.set("a", "1").await.unwrap();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));
        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[test]
    fn key_schema_matches_spec() {
        assert_eq!(
            TokenKeys::id_token("client123", "alice"),
            "CognitoIdentityServiceProvider.client123.alice.idToken"
        );
        assert_eq!(
            TokenKeys::last_auth_user("client123"),
            "CognitoIdentityServiceProvider.client123.LastAuthUser"
        );
        assert_eq!(
            TokenKeys::device_key("client123", "alice"),
            "CognitoIdentityServiceProvider.client123.alice.deviceKey"
        );
    }

    #[tokio::test]
    async fn file_store_round_trips_through_disk() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("cognito-srp-auth-test-{}-{n}", std::process::id()));
        let path = dir.join("tokens.json");
        {
            let store = FileTokenStore::new(&path).unwrap();
            store.set("k", "v").await.unwrap();
        }
        let reopened = FileTokenStore::new(&path).unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some("v".to_string()));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
