//! Credential type definitions

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Credential metadata (safe to display, never contains the secret)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialMetadata {
    /// Caller-generated unique identifier
    pub id: String,

    /// User-friendly name
    pub name: String,

    /// Platform the key belongs to (e.g. "openai", "github")
    pub platform: String,

    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered, de-duplicated tags
    #[serde(default)]
    pub tags: IndexSet<String>,

    /// When this credential was (last) stored
    pub created_at: DateTime<Utc>,

    /// Last successful secret fetch
    #[serde(default, alias = "lastAccessed")]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl CredentialMetadata {
    /// Build fresh metadata for a store call
    pub fn from_input(input: &CredentialInput) -> Self {
        Self {
            id: input.id.trim().to_string(),
            name: input.name.trim().to_string(),
            platform: input.platform.trim().to_string(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            tags: normalize_tags(input.tags.as_deref().unwrap_or_default()),
            created_at: Utc::now(),
            last_accessed_at: None,
        }
    }
}

/// Metadata fields supplied by the caller when storing a credential
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInput {
    pub id: String,
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl CredentialInput {
    pub fn new(id: impl Into<String>, name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            platform: platform.into(),
            description: None,
            tags: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Trim tags, drop empty ones and keep the first occurrence of duplicates
fn normalize_tags(tags: &[String]) -> IndexSet<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Secret value - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Consume and return the inner value
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_input_normalizes() {
        let input = CredentialInput::new(" key_1 ", " OpenAI ", "openai")
            .with_description("   ")
            .with_tags(["prod", " prod ", "", "billing"]);

        let metadata = CredentialMetadata::from_input(&input);
        assert_eq!(metadata.id, "key_1");
        assert_eq!(metadata.name, "OpenAI");
        assert_eq!(metadata.description, None);
        assert_eq!(
            metadata.tags.iter().cloned().collect::<Vec<_>>(),
            vec!["prod".to_string(), "billing".to_string()]
        );
        assert!(metadata.last_accessed_at.is_none());
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata =
            CredentialMetadata::from_input(&CredentialInput::new("key_1", "Stripe", "stripe"));
        let json = serde_json::to_value(&metadata).unwrap();

        assert!(json.get("createdAt").is_some());
        assert!(json.get("lastAccessedAt").unwrap().is_null());
        assert!(json.get("description").is_none());
        assert_eq!(json["tags"], serde_json::json!([]));
    }

    #[test]
    fn test_metadata_accepts_legacy_last_accessed() {
        let json = serde_json::json!({
            "id": "key_1",
            "name": "GitHub",
            "platform": "github",
            "tags": ["ci"],
            "createdAt": "2024-05-01T10:00:00Z",
            "lastAccessed": "2024-05-02T10:00:00Z"
        });

        let metadata: CredentialMetadata = serde_json::from_value(json).unwrap();
        assert!(metadata.last_accessed_at.is_some());
        assert!(metadata.tags.contains("ci"));
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = SecretString::new("sk-live-very-secret".to_string());
        let debug = format!("{:?}", secret);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("sk-live"));
        assert_eq!(secret.expose(), "sk-live-very-secret");
    }
}
