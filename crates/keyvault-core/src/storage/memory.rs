//! In-memory secret store
//!
//! Holds secrets in process memory only. Used for headless runs where no
//! keychain is reachable, and as the test double for the vault.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use zeroize::Zeroize;

use super::SecretStore;
use crate::error::Result;

/// In-memory secret store
#[derive(Default)]
pub struct MemorySecretStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Whether a secret exists for `id`
    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn put(&self, id: &str, secret: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(mut old) = entries.insert(id.to_string(), secret.to_vec()) {
            old.zeroize();
        }
        debug!("Stored secret in memory: {}", id);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if let Some(mut old) = self.entries.write().await.remove(id) {
            old.zeroize();
            debug!("Deleted secret from memory: {}", id);
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Storage"
    }
}

impl Drop for MemorySecretStore {
    fn drop(&mut self) {
        for value in self.entries.get_mut().values_mut() {
            value.zeroize();
        }
    }
}
