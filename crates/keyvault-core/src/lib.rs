//! # keyvault-core
//!
//! Core vault functionality for KeyVault including:
//! - OS keychain storage for secret payloads
//! - JSON document storage for non-secret metadata and preferences
//! - Authentication gating of every secret read, write and delete
//! - Clipboard exposure with compare-and-clear auto-clear

pub mod auth;
pub mod clipboard;
pub mod config;
pub mod credential;
pub mod error;
pub mod metadata;
pub mod storage;
mod vault;

pub use auth::{auth_gate_from_config, AuthCapabilities, AuthGate, CommandAuthGate, NoopAuthGate};
pub use clipboard::{ClipboardBackend, ClipboardExposure, MemoryClipboard, SystemClipboard};
pub use config::VaultConfig;
pub use credential::{CredentialInput, CredentialMetadata, SecretString};
pub use error::{ErrorKind, Result, VaultError};
pub use metadata::{JsonFileMetadataStore, MetadataStore, PreferencesDocument};
pub use storage::{KeychainSecretStore, MemorySecretStore, SecretStore};
pub use vault::{ConsistencyWarning, CredentialVault, MutationOutcome};
