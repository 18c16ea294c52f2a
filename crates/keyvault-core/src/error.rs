//! Error types for keyvault-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// None of the messages ever carry secret material: variants hold ids,
/// field names or backend diagnostics only.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Authentication required")]
    AuthDenied,

    #[error("API key not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Coarse error classification exposed to callers across the IPC boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    AuthDenied,
    NotFound,
    StorageFailure,
    ValidationFailure,
}

impl VaultError {
    /// Classify this error into the caller-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::AuthDenied => ErrorKind::AuthDenied,
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::ValidationFailure(_) => ErrorKind::ValidationFailure,
            VaultError::StorageError(_)
            | VaultError::KeychainError(_)
            | VaultError::ClipboardError(_)
            | VaultError::IoError(_)
            | VaultError::SerializationError(_) => ErrorKind::StorageFailure,
        }
    }

    /// Shorthand for a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        VaultError::ValidationFailure(msg.into())
    }
}
