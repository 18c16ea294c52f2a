//! KeyVault host - serves the vault IPC channels over stdio
//!
//! stdout carries protocol lines only; all logging goes to stderr.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyvault_core::config::DEFAULT_CLIPBOARD_CLEAR;
use keyvault_core::storage::DEFAULT_SERVICE_NAME;
use keyvault_core::{
    auth_gate_from_config, ClipboardExposure, CredentialVault, JsonFileMetadataStore,
    MemorySecretStore, VaultConfig,
};
use keyvault_ipc::{IpcHandler, StdioTransport};

/// KeyVault - local API key vault backed by the OS keychain
#[derive(Parser, Debug)]
#[command(name = "keyvault-host")]
#[command(version)]
#[command(about = "KeyVault IPC host - newline-delimited JSON over stdio")]
struct Args {
    /// Directory holding app-preferences.json
    #[arg(long, env = "KEYVAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Keychain service name for secret entries
    #[arg(long, env = "KEYVAULT_SERVICE", default_value = DEFAULT_SERVICE_NAME)]
    service: String,

    /// Command run to authenticate the user before secret operations
    #[arg(long, env = "KEYVAULT_AUTH_HELPER")]
    auth_helper: Option<String>,

    /// Default clipboard auto-clear delay in milliseconds (0 disables)
    #[arg(long, env = "KEYVAULT_CLIPBOARD_CLEAR_MS")]
    clipboard_clear_ms: Option<u64>,

    /// Keep secrets in process memory instead of the OS keychain
    #[arg(long)]
    memory_secrets: bool,

    /// Use a process-local clipboard instead of the OS clipboard
    #[arg(long)]
    memory_clipboard: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn vault_config(&self) -> anyhow::Result<VaultConfig> {
        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => VaultConfig::default_data_dir()?,
        };

        let mut config = VaultConfig::with_dir(data_dir);
        config.service_name = self.service.clone();
        config.auth_helper = self.auth_helper.as_deref().and_then(VaultConfig::parse_helper);
        config.clipboard_clear_after = match self.clipboard_clear_ms {
            Some(millis) => VaultConfig::clear_after_from_millis(millis),
            None => Some(DEFAULT_CLIPBOARD_CLEAR),
        };
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str())),
        )
        .init();

    let config = args.vault_config()?;
    info!("Using data directory {}", config.data_dir.display());

    let vault = if args.memory_secrets {
        warn!("Secrets are held in memory and will not survive exit");
        let metadata = JsonFileMetadataStore::open(&config.data_dir)
            .context("Failed to open preferences document")?;
        CredentialVault::new(
            Arc::new(MemorySecretStore::new()),
            Arc::new(metadata),
            auth_gate_from_config(&config)?,
        )
    } else {
        CredentialVault::open(&config).context("Failed to open vault")?
    };
    info!(
        "Vault ready (secret backend: {}, available: {}, auth: {})",
        vault.backend_name(),
        vault.secrets_available(),
        vault.auth_capabilities().method
    );

    let clipboard = if args.memory_clipboard {
        ClipboardExposure::in_memory()
    } else {
        match ClipboardExposure::system() {
            Ok(clipboard) => clipboard,
            Err(e) => {
                warn!("System clipboard unavailable, using in-process clipboard: {}", e);
                ClipboardExposure::in_memory()
            }
        }
    };

    let handler = IpcHandler::new(Arc::new(vault), clipboard, config.clipboard_clear_after);
    StdioTransport::new(handler).run().await?;

    Ok(())
}
