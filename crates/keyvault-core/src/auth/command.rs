//! Authentication through a host-provided helper program
//!
//! The helper is whatever the platform uses for user presence: a Touch ID
//! shim on macOS, `pkexec` on Linux, a Windows Hello wrapper. The purpose is
//! passed as the last argument and in `KEYVAULT_AUTH_PURPOSE`. Exit status 0
//! means the user authenticated.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{AuthCapabilities, AuthGate};
use crate::error::{Result, VaultError};

/// Environment variable carrying the prompt text for the helper
pub const PURPOSE_ENV: &str = "KEYVAULT_AUTH_PURPOSE";

/// Gate that runs an external helper per authentication
#[derive(Debug, Clone)]
pub struct CommandAuthGate {
    program: String,
    args: Vec<String>,
}

impl CommandAuthGate {
    /// Create a gate from `[program, args...]`
    pub fn new(command: Vec<String>) -> Result<Self> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| VaultError::validation("authentication helper command is empty"))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Helper program as configured
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the helper to an executable, searching `PATH` for bare names
    fn resolve_program(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }
}

#[async_trait]
impl AuthGate for CommandAuthGate {
    async fn authenticate(&self, purpose: &str) -> Result<()> {
        debug!("Requesting authentication: {}", purpose);

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(purpose)
            .env(PURPOSE_ENV, purpose)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                debug!("Authentication granted");
                Ok(())
            }
            Ok(status) => {
                warn!("Authentication declined or cancelled ({})", status);
                Err(VaultError::AuthDenied)
            }
            Err(e) => {
                warn!("Authentication helper unavailable: {}", e);
                Err(VaultError::AuthDenied)
            }
        }
    }

    fn capabilities(&self) -> AuthCapabilities {
        AuthCapabilities {
            available: self.resolve_program().is_some(),
            method: "command".to_string(),
        }
    }
}
