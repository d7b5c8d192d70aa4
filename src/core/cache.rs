use async_trait::async_trait;
use std::time::Duration;

/// Key-value cache with optional per-entry expiry.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    /// Returns the value if present and not expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores a value. `None` means the entry never expires.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);
}
