//! Input validation and id generation
//!
//! The secret check is a shallow sanity check, not format validation.

use rand::Rng;

use super::types::CredentialInput;
use crate::error::{Result, VaultError};

/// Minimum secret length for platforms issuing long-form tokens
const LONG_FORM_MIN_LENGTH: usize = 40;

/// Minimum secret length for everything else
const DEFAULT_MIN_LENGTH: usize = 10;

/// Platforms whose tokens are known to be long-form
const LONG_FORM_PLATFORMS: &[&str] = &["github"];

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Minimum accepted secret length for a platform
pub fn min_secret_length(platform: Option<&str>) -> usize {
    match platform {
        Some(p) if LONG_FORM_PLATFORMS.contains(&p.trim().to_ascii_lowercase().as_str()) => {
            LONG_FORM_MIN_LENGTH
        }
        _ => DEFAULT_MIN_LENGTH,
    }
}

/// Whether `secret` passes the validity predicate for `platform`
pub fn is_valid_secret(secret: &str, platform: Option<&str>) -> bool {
    let trimmed = secret.trim();
    !trimmed.is_empty() && trimmed.chars().count() >= min_secret_length(platform)
}

/// Validate a store request before anything is touched
pub fn validate_store(input: &CredentialInput, secret: &str) -> Result<()> {
    if input.id.trim().is_empty() {
        return Err(VaultError::validation("id is required"));
    }
    if input.name.trim().is_empty() {
        return Err(VaultError::validation("name is required"));
    }
    if input.platform.trim().is_empty() {
        return Err(VaultError::validation("platform is required"));
    }
    if !is_valid_secret(secret, Some(&input.platform)) {
        return Err(VaultError::ValidationFailure(format!(
            "API key must be at least {} characters for platform '{}'",
            min_secret_length(Some(&input.platform)),
            input.platform.trim()
        )));
    }
    Ok(())
}

/// Generate a fresh credential id: `key_<unix-millis>_<base36 suffix>`
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();

    format!("key_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}
