//! Authentication gate for privileged vault operations
//!
//! The gate wraps whatever user-presence primitive the host offers. Hosts
//! without one get [`NoopAuthGate`], which lets every operation through and
//! reports itself as unavailable so the UI can warn the user.

mod command;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::VaultConfig;
use crate::error::Result;

pub use command::CommandAuthGate;

/// What the gate can do on this host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCapabilities {
    /// Whether a real authentication primitive backs the gate
    pub available: bool,
    /// Short name of the mechanism ("none", "command")
    pub method: String,
}

/// Gate deciding whether a privileged operation may proceed
#[async_trait]
pub trait AuthGate: Send + Sync {
    /// Prompt the user with a human-readable `purpose`.
    ///
    /// Every failure of the underlying primitive maps to `VaultError::AuthDenied`.
    async fn authenticate(&self, purpose: &str) -> Result<()>;

    /// Report whether authentication is actually enforced
    fn capabilities(&self) -> AuthCapabilities;
}

/// Gate for hosts without an authentication primitive
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuthGate;

#[async_trait]
impl AuthGate for NoopAuthGate {
    async fn authenticate(&self, _purpose: &str) -> Result<()> {
        Ok(())
    }

    fn capabilities(&self) -> AuthCapabilities {
        AuthCapabilities {
            available: false,
            method: "none".to_string(),
        }
    }
}

/// Pick the gate for this host from configuration
pub fn auth_gate_from_config(config: &VaultConfig) -> Result<Arc<dyn AuthGate>> {
    match &config.auth_helper {
        Some(command) => {
            let gate = CommandAuthGate::new(command.clone())?;
            info!("Using authentication helper: {}", gate.program());
            Ok(Arc::new(gate))
        }
        None => {
            info!("No authentication helper configured - vault operations are not gated");
            Ok(Arc::new(NoopAuthGate))
        }
    }
}
