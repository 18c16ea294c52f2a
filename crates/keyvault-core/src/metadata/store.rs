//! Metadata store backed by a plain JSON file
//!
//! Stores non-sensitive data only: credential metadata and app preferences.
//! Every mutation rewrites the whole document.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::document::{
    get_path, is_reserved_key, set_path, PreferencesDocument, WindowBounds, API_KEYS_KEY,
};
use crate::credential::CredentialMetadata;
use crate::error::{Result, VaultError};

/// File name of the preferences document
pub const PREFERENCES_FILE: &str = "app-preferences.json";

const WINDOW_BOUNDS_KEY: &str = "windowBounds";
const THEME_KEY: &str = "theme";

/// Structured, non-secret record storage
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Current credential metadata list, in stored order
    async fn load(&self) -> Vec<CredentialMetadata>;

    /// Replace the whole credential metadata list
    async fn save_all(&self, entries: Vec<CredentialMetadata>) -> Result<()>;

    /// Read a preference by dotted key, or the whole document when `key` is `None`.
    ///
    /// Missing keys read as `Value::Null`.
    async fn get(&self, key: Option<&str>) -> Result<Value>;

    /// Write a preference by dotted key
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// JSON file metadata store
///
/// The document is cached in memory. Writers hold the write lock across the
/// temp-file write and rename and swap the cache only after the rename
/// succeeds, so readers never observe a half-applied update.
pub struct JsonFileMetadataStore {
    path: PathBuf,
    document: RwLock<PreferencesDocument>,
}

impl JsonFileMetadataStore {
    /// Open (or create) the preferences document in `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join(PREFERENCES_FILE);
        let document = Self::load_from_file(&path)?;

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, salvaging what parses.
    ///
    /// Malformed `apiKeys` entries and mistyped known preferences are dropped
    /// one by one, keeping a copy of the original as `.json.bak`. Only a file
    /// that is not a JSON object at all is moved aside wholesale.
    fn load_from_file(path: &Path) -> Result<PreferencesDocument> {
        if !path.exists() {
            debug!("No preferences file found, using defaults");
            return Ok(PreferencesDocument::default());
        }

        let backup = path.with_extension("json.bak");
        let contents = std::fs::read_to_string(path)?;
        let mut raw = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(raw)) => raw,
            Ok(_) | Err(_) => {
                warn!(
                    "Preferences file {:?} is corrupt, moving it to {:?}",
                    path, backup
                );
                std::fs::rename(path, &backup)?;
                return Ok(PreferencesDocument::default());
            }
        };

        let mut dropped = 0;

        let entries = match raw.remove(API_KEYS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!("Preferences field '{}' is not a list, ignoring it", API_KEYS_KEY);
                dropped += 1;
                Vec::new()
            }
        };
        let mut api_keys = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<CredentialMetadata>(entry) {
                Ok(metadata) => api_keys.push(metadata),
                Err(e) => {
                    warn!("Skipping malformed API key entry #{}: {}", index, e);
                    dropped += 1;
                }
            }
        }

        for field in [WINDOW_BOUNDS_KEY, THEME_KEY] {
            let Some(value) = raw.get(field) else {
                continue;
            };
            let well_typed = match field {
                WINDOW_BOUNDS_KEY => serde_json::from_value::<WindowBounds>(value.clone()).is_ok(),
                _ => value.is_string(),
            };
            if !well_typed {
                warn!("Preference '{}' has the wrong type, using the default", field);
                raw.remove(field);
                dropped += 1;
            }
        }

        let mut document: PreferencesDocument = serde_json::from_value(Value::Object(raw))?;
        document.api_keys = api_keys;

        if dropped > 0 {
            warn!(
                "Dropped {} unreadable item(s) from {:?}, original kept at {:?}",
                dropped, path, backup
            );
            std::fs::copy(path, &backup)?;
        }

        debug!(
            "Loaded preferences from {:?} ({} API keys)",
            path,
            document.api_keys.len()
        );
        Ok(document)
    }

    /// Write the document atomically using a temp file
    async fn persist(&self, document: &PreferencesDocument) -> Result<()> {
        let contents = serde_json::to_string_pretty(document)?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!("Saved preferences to {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for JsonFileMetadataStore {
    async fn load(&self) -> Vec<CredentialMetadata> {
        self.document.read().await.api_keys.clone()
    }

    async fn save_all(&self, entries: Vec<CredentialMetadata>) -> Result<()> {
        let mut document = self.document.write().await;

        let mut next = document.clone();
        next.api_keys = entries;
        self.persist(&next).await?;

        *document = next;
        Ok(())
    }

    async fn get(&self, key: Option<&str>) -> Result<Value> {
        let document = self.document.read().await;
        let value = serde_json::to_value(&*document)?;

        Ok(match key {
            Some(key) => get_path(&value, key).cloned().unwrap_or(Value::Null),
            None => value,
        })
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        if key.trim().is_empty() || key.split('.').any(str::is_empty) {
            return Err(VaultError::validation("preference key is required"));
        }
        if is_reserved_key(key) {
            return Err(VaultError::ValidationFailure(format!(
                "'{}' is managed by the vault and cannot be set directly",
                key
            )));
        }

        let mut document = self.document.write().await;

        let mut raw = serde_json::to_value(&*document)?;
        if !set_path(&mut raw, key, value) {
            return Err(VaultError::ValidationFailure(format!(
                "preference path '{}' crosses a non-object value",
                key
            )));
        }
        let next: PreferencesDocument = serde_json::from_value(raw).map_err(|e| {
            VaultError::ValidationFailure(format!("invalid value for '{}': {}", key, e))
        })?;

        self.persist(&next).await?;
        *document = next;

        debug!("Preference updated: {}", key);
        Ok(())
    }
}
