//! Secret storage backends
//!
//! This module provides two backends for the secret half of a credential:
//! 1. OS Keychain (the production backend)
//! 2. In-memory map (headless runs and tests)

mod traits;
mod keychain;
mod memory;

pub use traits::SecretStore;
pub use keychain::{KeychainSecretStore, DEFAULT_SERVICE_NAME};
pub use memory::MemorySecretStore;
