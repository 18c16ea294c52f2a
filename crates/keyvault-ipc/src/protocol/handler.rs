//! IPC request handler

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use zeroize::Zeroize;

use keyvault_core::credential::{generate_id, is_valid_secret};
use keyvault_core::{
    ClipboardExposure, CredentialInput, CredentialVault, MetadataStore, MutationOutcome,
    VaultConfig, VaultError,
};

use super::channels;
use super::types::*;

/// Body of an `api-keys:store` request
#[derive(Deserialize)]
struct StoreKeyRequest {
    #[serde(flatten)]
    input: CredentialInput,
    key: String,
}

impl Drop for StoreKeyRequest {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Dispatches IPC channels onto the vault, preferences and clipboard
pub struct IpcHandler {
    vault: Arc<CredentialVault>,
    clipboard: ClipboardExposure,
    /// Applied to `clipboard:write-text` when no delay is given
    default_clear_after: Option<Duration>,
}

impl IpcHandler {
    pub fn new(
        vault: Arc<CredentialVault>,
        clipboard: ClipboardExposure,
        default_clear_after: Option<Duration>,
    ) -> Self {
        Self {
            vault,
            clipboard,
            default_clear_after,
        }
    }

    /// Handle one request; failures are folded into the envelope
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        debug!("Handling request on channel {}", request.channel);
        let result = self.dispatch(&request.channel, request.args).await;
        IpcResponse::new(request.id, result)
    }

    /// Route a channel to its operation
    pub async fn dispatch(&self, channel: &str, args: Vec<Value>) -> Envelope {
        let result = match channel {
            channels::API_KEYS_STORE => self.store_key(args).await,
            channels::API_KEYS_GET => self.get_key(&args).await,
            channels::API_KEYS_LIST => Ok(self.list_keys().await),
            channels::API_KEYS_DELETE => self.delete_key(&args).await,
            channels::AUTH_CHECK_BIOMETRIC => Ok(self.check_biometric()),
            channels::PREFERENCES_GET => self.get_preference(&args).await,
            channels::PREFERENCES_SET => self.set_preference(args).await,
            channels::CLIPBOARD_WRITE_TEXT => self.write_clipboard(&args),
            channels::CLIPBOARD_READ_TEXT => self.read_clipboard(),
            channels::CLIPBOARD_CLEAR => self.clear_clipboard(),
            channels::UTILS_GENERATE_ID => Ok(Envelope::ok_with("id", generate_id())),
            channels::UTILS_VALIDATE_KEY => validate_key(&args),
            _ => {
                warn!("Unknown channel: {}", channel);
                Err(Envelope::invalid_request(format!("Unknown channel: {}", channel)))
            }
        };

        result.unwrap_or_else(|envelope| envelope)
    }

    async fn store_key(&self, mut args: Vec<Value>) -> Result<Envelope, Envelope> {
        if args.is_empty() {
            return Err(Envelope::invalid_request("Missing API key payload"));
        }
        // Serde errors can quote field values, so the message stays generic
        let request: StoreKeyRequest = serde_json::from_value(args.swap_remove(0))
            .map_err(|_| {
                Envelope::invalid_request(
                    "Invalid API key payload: expected { id, name, platform, key }",
                )
            })?;

        match self.vault.store(&request.input, &request.key).await {
            Ok(outcome) => Ok(mutation_envelope(outcome)),
            Err(e) => {
                error!("Failed to store API key {}: {}", request.input.id, e);
                Err(Envelope::from_error(&e))
            }
        }
    }

    async fn get_key(&self, args: &[Value]) -> Result<Envelope, Envelope> {
        let id = string_arg(args, 0, "id")?;
        match self.vault.fetch(id).await {
            Ok(secret) => Ok(Envelope::ok_with("key", secret.into_inner())),
            Err(e) => {
                error!("Failed to get API key {}: {}", id, e);
                Err(Envelope::from_error(&e))
            }
        }
    }

    async fn list_keys(&self) -> Envelope {
        let keys = self.vault.list().await;
        match serde_json::to_value(keys) {
            Ok(keys) => Envelope::ok_with("keys", keys),
            Err(e) => Envelope::from_error(&VaultError::from(e)),
        }
    }

    async fn delete_key(&self, args: &[Value]) -> Result<Envelope, Envelope> {
        let id = string_arg(args, 0, "id")?;
        match self.vault.delete(id).await {
            Ok(outcome) => Ok(mutation_envelope(outcome)),
            Err(e) => {
                error!("Failed to delete API key {}: {}", id, e);
                Err(Envelope::from_error(&e))
            }
        }
    }

    fn check_biometric(&self) -> Envelope {
        let capabilities = self.vault.auth_capabilities();
        Envelope::ok_with("available", capabilities.available)
            .with("method", capabilities.method)
    }

    async fn get_preference(&self, args: &[Value]) -> Result<Envelope, Envelope> {
        let key = optional_string_arg(args, 0, "key")?;
        self.vault
            .metadata_store()
            .get(key)
            .await
            .map(|value| Envelope::ok_with("value", value))
            .map_err(|e| {
                error!("Failed to read preference: {}", e);
                Envelope::from_error(&e)
            })
    }

    async fn set_preference(&self, mut args: Vec<Value>) -> Result<Envelope, Envelope> {
        let key = string_arg(&args, 0, "key")?.to_string();
        let value = if args.len() > 1 {
            args.swap_remove(1)
        } else {
            Value::Null
        };

        self.vault
            .metadata_store()
            .set(&key, value)
            .await
            .map(|()| Envelope::ok())
            .map_err(|e| {
                error!("Failed to set preference {}: {}", key, e);
                Envelope::from_error(&e)
            })
    }

    fn write_clipboard(&self, args: &[Value]) -> Result<Envelope, Envelope> {
        let text = string_arg(args, 0, "text")?;
        let clear_after = match args.get(1) {
            None | Some(Value::Null) => self.default_clear_after,
            Some(value) => {
                let millis = value.as_u64().ok_or_else(|| {
                    Envelope::invalid_request("autoClearMs must be a non-negative integer")
                })?;
                VaultConfig::clear_after_from_millis(millis)
            }
        };

        self.clipboard
            .expose_secret(text, clear_after)
            .map(|()| Envelope::ok())
            .map_err(|e| {
                error!("Failed to write clipboard: {}", e);
                Envelope::from_error(&e)
            })
    }

    fn read_clipboard(&self) -> Result<Envelope, Envelope> {
        self.clipboard
            .read_text()
            .map(|text| Envelope::ok_with("text", text))
            .map_err(|e| Envelope::from_error(&e))
    }

    fn clear_clipboard(&self) -> Result<Envelope, Envelope> {
        self.clipboard
            .clear()
            .map(|()| Envelope::ok())
            .map_err(|e| Envelope::from_error(&e))
    }
}

fn validate_key(args: &[Value]) -> Result<Envelope, Envelope> {
    let key = string_arg(args, 0, "key")?;
    let platform = optional_string_arg(args, 1, "platform")?;
    Ok(Envelope::ok_with("valid", is_valid_secret(key, platform)))
}

fn mutation_envelope(outcome: MutationOutcome) -> Envelope {
    Envelope::ok().with_warning(outcome.warning.map(|w| w.to_string()))
}

fn string_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str, Envelope> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(Envelope::invalid_request(format!("{} must be a string", name))),
        None => Err(Envelope::invalid_request(format!("Missing argument: {}", name))),
    }
}

fn optional_string_arg<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<Option<&'a str>, Envelope> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Envelope::invalid_request(format!("{} must be a string", name))),
    }
}
