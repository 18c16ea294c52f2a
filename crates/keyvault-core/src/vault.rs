//! Credential vault orchestration
//!
//! Splits each credential into a secret half (SecretStore) and a metadata
//! half (MetadataStore), gates secret access behind the AuthGate and keeps
//! the halves paired across partial failures.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{auth_gate_from_config, AuthCapabilities, AuthGate};
use crate::config::VaultConfig;
use crate::credential::{validate_store, CredentialInput, CredentialMetadata, SecretString};
use crate::error::{Result, VaultError};
use crate::metadata::{JsonFileMetadataStore, MetadataStore};
use crate::storage::{KeychainSecretStore, SecretStore};

const STORE_PURPOSE: &str = "Authenticate to store API key";
const FETCH_PURPOSE: &str = "Authenticate to access API key";
const DELETE_PURPOSE: &str = "Authenticate to delete API key";

/// One half of a credential changed but its pair could not follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub id: String,
    pub message: String,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.id)
    }
}

/// Result of a successful mutating vault operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Set when the operation completed but the two halves drifted
    pub warning: Option<ConsistencyWarning>,
}

impl MutationOutcome {
    fn clean() -> Self {
        Self::default()
    }

    fn drifted(id: &str, message: &str) -> Self {
        let warning = ConsistencyWarning {
            id: id.to_string(),
            message: message.to_string(),
        };
        warn!("Consistency warning: {}", warning);
        Self {
            warning: Some(warning),
        }
    }
}

/// The credential vault
pub struct CredentialVault {
    /// Secret half
    secrets: Arc<dyn SecretStore>,
    /// Metadata half (and preferences)
    metadata: Arc<dyn MetadataStore>,
    /// Authentication gate
    gate: Arc<dyn AuthGate>,
    /// Serializes read-modify-write of the metadata document
    mutation_lock: Mutex<()>,
}

impl CredentialVault {
    /// Create a vault from explicit components
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        metadata: Arc<dyn MetadataStore>,
        gate: Arc<dyn AuthGate>,
    ) -> Self {
        Self {
            secrets,
            metadata,
            gate,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Open the production vault: OS keychain, JSON preferences, configured gate
    pub fn open(config: &VaultConfig) -> Result<Self> {
        let secrets = Arc::new(KeychainSecretStore::new(config.service_name.clone()));
        let metadata = Arc::new(JsonFileMetadataStore::open(&config.data_dir)?);
        let gate = auth_gate_from_config(config)?;

        info!(
            "Vault opened (secrets: {}, metadata: {:?})",
            secrets.backend_name(),
            metadata.path()
        );
        if !secrets.is_available() {
            warn!(
                "{} is not reachable; secret operations will fail with a storage error",
                secrets.backend_name()
            );
        }
        Ok(Self::new(secrets, metadata, gate))
    }

    /// Store a credential, replacing any existing one with the same id
    pub async fn store(&self, input: &CredentialInput, secret: &str) -> Result<MutationOutcome> {
        validate_store(input, secret)?;
        self.gate.authenticate(STORE_PURPOSE).await?;

        let metadata = CredentialMetadata::from_input(input);
        let id = metadata.id.clone();

        let _guard = self.mutation_lock.lock().await;

        // The secret write is the linearization point
        self.secrets.put(&id, secret.as_bytes()).await?;

        let mut entries = self.metadata.load().await;
        let existed = entries.iter().any(|m| m.id == id);
        entries.retain(|m| m.id != id);
        entries.push(metadata.clone());

        match self.metadata.save_all(entries).await {
            Ok(()) => {
                info!("Stored API key: {} ({})", metadata.name, metadata.platform);
                Ok(MutationOutcome::clean())
            }
            Err(e) if existed => {
                warn!("Metadata update failed after replacing secret {}: {}", id, e);
                Ok(MutationOutcome::drifted(
                    &id,
                    "API key saved but its details could not be updated",
                ))
            }
            Err(e) => {
                // New id: undo the secret so no unlisted secret is left behind
                if let Err(undo) = self.secrets.delete(&id).await {
                    warn!(
                        "Consistency warning: secret {} stored without metadata, rollback failed: {}",
                        id, undo
                    );
                }
                Err(e)
            }
        }
    }

    /// Fetch a secret, updating its last-accessed timestamp on success
    pub async fn fetch(&self, id: &str) -> Result<SecretString> {
        let id = id.trim();
        if id.is_empty() {
            return Err(VaultError::validation("id is required"));
        }

        self.gate.authenticate(FETCH_PURPOSE).await?;

        let bytes = self
            .secrets
            .get(id)
            .await?
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

        let secret = String::from_utf8(bytes)
            .map(SecretString::new)
            .map_err(|_| VaultError::StorageError("Stored secret is not valid UTF-8".to_string()))?;

        self.touch_last_accessed(id).await;

        debug!("Fetched API key: {}", id);
        Ok(secret)
    }

    /// List all credential metadata (never gated, never fails)
    pub async fn list(&self) -> Vec<CredentialMetadata> {
        self.metadata.load().await
    }

    /// Delete both halves of a credential
    pub async fn delete(&self, id: &str) -> Result<MutationOutcome> {
        let id = id.trim();
        if id.is_empty() {
            return Err(VaultError::validation("id is required"));
        }

        self.gate.authenticate(DELETE_PURPOSE).await?;

        let _guard = self.mutation_lock.lock().await;

        // Secret first; metadata follows
        self.secrets.delete(id).await?;

        let mut entries = self.metadata.load().await;
        let before = entries.len();
        entries.retain(|m| m.id != id);
        if entries.len() == before {
            debug!("No metadata to remove for {}", id);
            info!("Deleted API key: {}", id);
            return Ok(MutationOutcome::clean());
        }

        match self.metadata.save_all(entries).await {
            Ok(()) => {
                info!("Deleted API key: {}", id);
                Ok(MutationOutcome::clean())
            }
            Err(e) => {
                warn!("Metadata removal failed after deleting secret {}: {}", id, e);
                Ok(MutationOutcome::drifted(
                    id,
                    "API key deleted but its details could not be removed",
                ))
            }
        }
    }

    /// Authentication capabilities of the configured gate
    pub fn auth_capabilities(&self) -> AuthCapabilities {
        self.gate.capabilities()
    }

    /// Name of the secret storage backend
    pub fn backend_name(&self) -> &'static str {
        self.secrets.backend_name()
    }

    /// Whether the secret backend answered its availability probe
    pub fn secrets_available(&self) -> bool {
        self.secrets.is_available()
    }

    /// The metadata store, which also serves generic preferences
    pub fn metadata_store(&self) -> Arc<dyn MetadataStore> {
        self.metadata.clone()
    }

    /// Best-effort last-accessed update; dropped under contention
    async fn touch_last_accessed(&self, id: &str) {
        let Ok(_guard) = self.mutation_lock.try_lock() else {
            debug!("Skipping last-accessed update for {}: metadata busy", id);
            return;
        };

        let mut entries = self.metadata.load().await;
        let Some(entry) = entries.iter_mut().find(|m| m.id == id) else {
            debug!("No metadata to timestamp for {}", id);
            return;
        };
        entry.last_accessed_at = Some(Utc::now());

        if let Err(e) = self.metadata.save_all(entries).await {
            warn!("Failed to update last-accessed time for {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoopAuthGate;
    use crate::storage::MemorySecretStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    const SECRET: &str = "sk-test-1234567890";

    /// Gate that always refuses and counts prompts
    #[derive(Default)]
    struct DenyGate {
        prompts: AtomicUsize,
    }

    #[async_trait]
    impl AuthGate for DenyGate {
        async fn authenticate(&self, _purpose: &str) -> Result<()> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            Err(VaultError::AuthDenied)
        }

        fn capabilities(&self) -> AuthCapabilities {
            AuthCapabilities {
                available: true,
                method: "test".to_string(),
            }
        }
    }

    /// Secret store whose writes and deletes can be made to fail
    #[derive(Default)]
    struct FlakySecretStore {
        inner: MemorySecretStore,
        fail_put: AtomicBool,
        fail_delete: AtomicBool,
        unavailable: AtomicBool,
    }

    #[async_trait]
    impl SecretStore for FlakySecretStore {
        async fn put(&self, id: &str, secret: &[u8]) -> Result<()> {
            if self.fail_put.load(Ordering::SeqCst) {
                return Err(VaultError::KeychainError("write refused".to_string()));
            }
            self.inner.put(id, secret).await
        }

        async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
            self.inner.get(id).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(VaultError::KeychainError("delete refused".to_string()));
            }
            self.inner.delete(id).await
        }

        fn is_available(&self) -> bool {
            !self.unavailable.load(Ordering::SeqCst)
        }

        fn backend_name(&self) -> &'static str {
            "Flaky"
        }
    }

    /// Metadata store whose saves can be made to fail
    struct FlakyMetadataStore {
        inner: JsonFileMetadataStore,
        fail_save: AtomicBool,
    }

    #[async_trait]
    impl MetadataStore for FlakyMetadataStore {
        async fn load(&self) -> Vec<CredentialMetadata> {
            self.inner.load().await
        }

        async fn save_all(&self, entries: Vec<CredentialMetadata>) -> Result<()> {
            if self.fail_save.load(Ordering::SeqCst) {
                return Err(VaultError::StorageError("disk full".to_string()));
            }
            self.inner.save_all(entries).await
        }

        async fn get(&self, key: Option<&str>) -> Result<Value> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value) -> Result<()> {
            self.inner.set(key, value).await
        }
    }

    struct Harness {
        vault: CredentialVault,
        secrets: Arc<FlakySecretStore>,
        metadata: Arc<FlakyMetadataStore>,
        _temp: TempDir,
    }

    fn harness_with_gate(gate: Arc<dyn AuthGate>) -> Harness {
        let temp = TempDir::new().unwrap();
        let secrets = Arc::new(FlakySecretStore::default());
        let metadata = Arc::new(FlakyMetadataStore {
            inner: JsonFileMetadataStore::open(temp.path()).unwrap(),
            fail_save: AtomicBool::new(false),
        });
        let vault = CredentialVault::new(secrets.clone(), metadata.clone(), gate);
        Harness {
            vault,
            secrets,
            metadata,
            _temp: temp,
        }
    }

    fn harness() -> Harness {
        harness_with_gate(Arc::new(NoopAuthGate))
    }

    fn input(id: &str) -> CredentialInput {
        CredentialInput::new(id, "OpenAI", "openai").with_tags(["prod"])
    }

    #[tokio::test]
    async fn test_store_and_fetch() {
        let h = harness();

        let outcome = h.vault.store(&input("key_1"), SECRET).await.unwrap();
        assert!(outcome.warning.is_none());

        let secret = h.vault.fetch("key_1").await.unwrap();
        assert_eq!(secret.expose(), SECRET);
    }

    #[tokio::test]
    async fn test_store_keeps_secret_verbatim() {
        let h = harness();
        let padded = "  sk-test-1234567890  ";

        h.vault.store(&input("key_1"), padded).await.unwrap();
        assert_eq!(h.vault.fetch("key_1").await.unwrap().expose(), padded);
    }

    #[tokio::test]
    async fn test_metadata_never_holds_secret() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();

        let document = h.metadata.get(None).await.unwrap().to_string();
        assert!(!document.contains(SECRET));
    }

    #[tokio::test]
    async fn test_replace_moves_entry_to_end() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();
        h.vault.store(&input("key_2"), SECRET).await.unwrap();
        h.vault
            .store(&CredentialInput::new("key_1", "Renamed", "openai"), "sk-other-1234567890")
            .await
            .unwrap();

        let list = h.vault.list().await;
        let ids: Vec<&str> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["key_2", "key_1"]);
        assert_eq!(list[1].name, "Renamed");
        assert_eq!(h.vault.fetch("key_1").await.unwrap().expose(), "sk-other-1234567890");
    }

    #[tokio::test]
    async fn test_replace_resets_last_accessed() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();
        h.vault.fetch("key_1").await.unwrap();
        assert!(h.vault.list().await[0].last_accessed_at.is_some());

        h.vault.store(&input("key_1"), SECRET).await.unwrap();
        assert!(h.vault.list().await[0].last_accessed_at.is_none());
    }

    #[tokio::test]
    async fn test_validation_happens_before_auth() {
        let gate = Arc::new(DenyGate::default());
        let h = harness_with_gate(gate.clone());

        let err = h
            .vault
            .store(&CredentialInput::new("key_1", "", "openai"), SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::ValidationFailure(_)));
        assert_eq!(gate.prompts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_denied_gate_leaves_stores_untouched() {
        let gate = Arc::new(DenyGate::default());
        let h = harness_with_gate(gate.clone());

        assert!(matches!(
            h.vault.store(&input("key_1"), SECRET).await,
            Err(VaultError::AuthDenied)
        ));
        assert!(matches!(h.vault.fetch("key_1").await, Err(VaultError::AuthDenied)));
        assert!(matches!(h.vault.delete("key_1").await, Err(VaultError::AuthDenied)));

        assert_eq!(gate.prompts.load(Ordering::SeqCst), 3);
        assert!(h.secrets.inner.is_empty().await);
        assert!(h.vault.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_secret_write_failure_skips_metadata() {
        let h = harness();
        h.secrets.fail_put.store(true, Ordering::SeqCst);

        let err = h.vault.store(&input("key_1"), SECRET).await.unwrap_err();
        assert!(matches!(err, VaultError::KeychainError(_)));
        assert!(h.vault.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_new_id_metadata_failure_rolls_back_secret() {
        let h = harness();
        h.metadata.fail_save.store(true, Ordering::SeqCst);

        let err = h.vault.store(&input("key_1"), SECRET).await.unwrap_err();
        assert!(matches!(err, VaultError::StorageError(_)));
        assert!(!h.secrets.inner.contains("key_1").await);
        assert!(h.vault.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_metadata_failure_warns() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();
        h.metadata.fail_save.store(true, Ordering::SeqCst);

        let outcome = h.vault.store(&input("key_1"), "sk-new-1234567890").await.unwrap();
        let warning = outcome.warning.unwrap();
        assert_eq!(warning.id, "key_1");
        assert!(!warning.to_string().contains("sk-new"));

        // Both halves still exist and pair up
        assert_eq!(h.vault.list().await.len(), 1);
        assert_eq!(h.vault.fetch("key_1").await.unwrap().expose(), "sk-new-1234567890");
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let h = harness();
        let err = h.vault.fetch("key_missing").await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound(ref id) if id == "key_missing"));
    }

    #[tokio::test]
    async fn test_fetch_survives_timestamp_failure() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();
        h.metadata.fail_save.store(true, Ordering::SeqCst);

        assert_eq!(h.vault.fetch("key_1").await.unwrap().expose(), SECRET);
        assert!(h.vault.list().await[0].last_accessed_at.is_none());
    }

    #[tokio::test]
    async fn test_fetch_skips_timestamp_when_busy() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();

        let guard = h.vault.mutation_lock.lock().await;
        assert_eq!(h.vault.fetch("key_1").await.unwrap().expose(), SECRET);
        drop(guard);

        assert!(h.vault.list().await[0].last_accessed_at.is_none());
    }

    #[tokio::test]
    async fn test_delete_secret_failure_keeps_metadata() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();
        h.secrets.fail_delete.store(true, Ordering::SeqCst);

        assert!(h.vault.delete("key_1").await.is_err());
        assert_eq!(h.vault.list().await.len(), 1);
        assert!(h.secrets.inner.contains("key_1").await);
    }

    #[tokio::test]
    async fn test_delete_metadata_failure_warns() {
        let h = harness();
        h.vault.store(&input("key_1"), SECRET).await.unwrap();
        h.metadata.fail_save.store(true, Ordering::SeqCst);

        let outcome = h.vault.delete("key_1").await.unwrap();
        assert!(outcome.warning.is_some());
        assert!(matches!(h.vault.fetch("key_1").await, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_succeeds() {
        let h = harness();
        let outcome = h.vault.delete("key_unknown").await.unwrap();
        assert!(outcome.warning.is_none());
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let h = harness();
        assert!(matches!(
            h.vault.fetch("  ").await,
            Err(VaultError::ValidationFailure(_))
        ));
        assert!(matches!(
            h.vault.delete("").await,
            Err(VaultError::ValidationFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_capabilities_passthrough() {
        let h = harness();
        assert!(!h.vault.auth_capabilities().available);
        assert_eq!(h.vault.backend_name(), "Flaky");
    }

    #[tokio::test]
    async fn test_secrets_availability_passthrough() {
        let h = harness();
        assert!(h.vault.secrets_available());

        h.secrets.unavailable.store(true, Ordering::SeqCst);
        assert!(!h.vault.secrets_available());
    }
}
