//! Vault configuration
//!
//! Where the preferences document lives, which keychain service owns the
//! secrets, how authentication is performed and the default clipboard
//! lifetime. The host binary fills this from CLI flags and environment.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, VaultError};
use crate::storage::DEFAULT_SERVICE_NAME;

/// Default delay before a copied secret is cleared from the clipboard
pub const DEFAULT_CLIPBOARD_CLEAR: Duration = Duration::from_secs(30);

/// Vault configuration
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Directory holding `app-preferences.json`
    pub data_dir: PathBuf,
    /// Keychain service name for secret entries
    pub service_name: String,
    /// Authentication helper as `[program, args...]`; `None` disables gating
    pub auth_helper: Option<Vec<String>>,
    /// Clipboard auto-clear applied when the caller gives no delay
    pub clipboard_clear_after: Option<Duration>,
}

impl VaultConfig {
    /// Configuration rooted at the platform data directory
    pub fn new() -> Result<Self> {
        Ok(Self::with_dir(Self::default_data_dir()?))
    }

    /// Configuration rooted at a custom directory (for testing)
    pub fn with_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            auth_helper: None,
            clipboard_clear_after: Some(DEFAULT_CLIPBOARD_CLEAR),
        }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "keyvault", "keyvault")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| {
                VaultError::StorageError("Could not determine data directory".to_string())
            })
    }

    /// Split a helper command line on whitespace
    pub fn parse_helper(command: &str) -> Option<Vec<String>> {
        let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        (!parts.is_empty()).then_some(parts)
    }

    /// Convert a millisecond setting, where 0 disables auto-clear
    pub fn clear_after_from_millis(millis: u64) -> Option<Duration> {
        (millis > 0).then(|| Duration::from_millis(millis))
    }
}
