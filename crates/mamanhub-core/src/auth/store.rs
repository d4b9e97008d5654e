use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use super::Credentials;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Failed to access token file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse token file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token store lock poisoned")]
    Poisoned,
}

/// Persisted key-value holder of the current token pair.
///
/// Implementations are shared between concurrent requests; no transaction
/// discipline is applied, the last writer wins.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// The stored access token, treating an empty value as absent
    fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// The stored refresh token, treating an empty value as absent
    fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    fn credentials(&self) -> Result<Option<Credentials>, StoreError> {
        match (self.access_token()?, self.refresh_token()?) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(Credentials {
                access_token,
                refresh_token,
            })),
            _ => Ok(None),
        }
    }

    fn save_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.set(ACCESS_TOKEN_KEY, &credentials.access_token)?;
        self.set(REFRESH_TOKEN_KEY, &credentials.refresh_token)
    }

    /// Delete both tokens. Both deletions are attempted even if the first fails.
    fn clear_credentials(&self) -> Result<(), StoreError> {
        let access = self.delete(ACCESS_TOKEN_KEY);
        let refresh = self.delete(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }
}

/// In-process token store. Tokens are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: &Credentials) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.write() {
            values.insert(ACCESS_TOKEN_KEY.to_string(), credentials.access_token.clone());
            values.insert(REFRESH_TOKEN_KEY.to_string(), credentials.refresh_token.clone());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}
