//! OS Keychain storage backend
//!
//! Uses the system keychain for secret payloads:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)
//!
//! Entries are addressed by `(service name, credential id)`.

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::SecretStore;
use crate::error::{Result, VaultError};

/// Default service name used for keychain entries
pub const DEFAULT_SERVICE_NAME: &str = "KeyVault";

/// Account used to probe whether the keychain accepts writes
const AVAILABILITY_PROBE: &str = "__keyvault_availability__";

/// OS Keychain storage backend
pub struct KeychainSecretStore {
    /// Keychain service name shared by all entries
    service: String,
    /// Whether keychain is available
    available: bool,
}

impl KeychainSecretStore {
    /// Create a keychain store for the given service name
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let available = Self::test_availability(&service);

        if available {
            debug!("Keychain storage is available for service {}", service);
        } else {
            warn!("Keychain storage is not available - secret operations will fail");
        }

        Self { service, available }
    }

    /// Test if the keychain is available
    fn test_availability(service: &str) -> bool {
        match Entry::new(service, AVAILABILITY_PROBE) {
            Ok(entry) => {
                if entry.set_password("probe").is_ok() {
                    let _ = entry.delete_password();
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    /// Service name these entries live under
    pub fn service(&self) -> &str {
        &self.service
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(VaultError::KeychainError("Keychain not available".to_string()))
        }
    }

    /// Run a blocking keychain call for `id` off the async executor
    async fn with_entry<T, F>(&self, id: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T> + Send + 'static,
    {
        self.ensure_available()?;

        let service = self.service.clone();
        let account = id.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &account)
                .map_err(|e| VaultError::KeychainError(e.to_string()))?;
            op(entry)
        })
        .await
        .map_err(|e| VaultError::StorageError(format!("Keychain task failed: {}", e)))?
    }
}

#[async_trait]
impl SecretStore for KeychainSecretStore {
    async fn put(&self, id: &str, secret: &[u8]) -> Result<()> {
        // Keychain entries are passwords; credentials are text by construction
        let password = std::str::from_utf8(secret)
            .map_err(|_| VaultError::StorageError("Secret is not valid UTF-8".to_string()))?
            .to_string();

        self.with_entry(id, move |entry| {
            entry
                .set_password(&password)
                .map_err(|e| VaultError::KeychainError(e.to_string()))
        })
        .await?;

        debug!("Stored secret in keychain: {}", id);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .with_entry(id, |entry| match entry.get_password() {
                Ok(password) => Ok(Some(password.into_bytes())),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(VaultError::KeychainError(e.to_string())),
            })
            .await?;

        match result {
            Some(_) => debug!("Retrieved secret from keychain: {}", id),
            None => debug!("Secret not found in keychain: {}", id),
        }
        Ok(result)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.with_entry(id, |entry| match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(VaultError::KeychainError(e.to_string())),
        })
        .await?;

        debug!("Deleted secret from keychain: {}", id);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}
