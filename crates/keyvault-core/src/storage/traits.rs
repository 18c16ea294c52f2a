//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Opaque id -> bytes storage for secret payloads
///
/// Implementations know nothing about credential metadata. A successful
/// `put` is durable once it returns.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store (or replace) the secret for `id`
    async fn put(&self, id: &str, secret: &[u8]) -> Result<()>;

    /// Retrieve the secret for `id`, `None` when absent
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Delete the secret for `id`; deleting an absent entry succeeds
    async fn delete(&self, id: &str) -> Result<()>;

    /// Whether the backing facility is usable on this host
    fn is_available(&self) -> bool;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
