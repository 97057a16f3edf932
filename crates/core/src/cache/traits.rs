use std::time::Duration;

use async_trait::async_trait;

use super::{contains_pattern, Result};

/// Trait for basic cache operations.
///
/// Values are opaque bytes; typed access goes through
/// [`serialize_value`](super::serialize_value) and
/// [`deserialize_value`](super::deserialize_value).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value by key. Expired entries read as a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value with an optional TTL, overwriting any previous value.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Removes a single entry. No-op when the key is absent.
    async fn invalidate(&self, key: &str) -> Result<()>;

    /// Removes all entries matching a glob pattern (e.g., "read:*:north").
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Removes every entry whose key contains `fragment` as a substring.
    async fn invalidate_by_prefix(&self, fragment: &str) -> Result<()> {
        self.delete_pattern(&contains_pattern(fragment)).await
    }

    /// Removes all entries.
    async fn clear(&self) -> Result<()>;
}
