//! Access token slot on top of a persistent storage backend

use crate::error::Result;
use crate::storage::{MemoryStorage, Storage};
use std::sync::Arc;
use tracing::debug;

/// Storage key the access token lives under
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Single-slot access token store
///
/// Holds at most one token. An absent or empty value means the user is not
/// authenticated.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
    key: String,
}

impl TokenStore {
    /// Create a token store over the given storage using the default key
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_key(storage, ACCESS_TOKEN_KEY)
    }

    pub fn with_key(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Create a token store that only lives in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Get the current access token
    pub fn get(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(&self.key)?
            .filter(|token| !token.is_empty()))
    }

    /// Overwrite the access token
    pub fn store(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return self.clear();
        }
        self.storage.set(&self.key, token)?;
        debug!(key = %self.key, "Access token stored");
        Ok(())
    }

    /// Forget the access token
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(&self.key)?;
        debug!(key = %self.key, "Access token cleared");
        Ok(())
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get()?.is_some())
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
