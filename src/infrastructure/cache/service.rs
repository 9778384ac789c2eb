//! Cache service trait and error types.

use async_trait::async_trait;

use crate::domain::entities::Link;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for caching resolved links by slug.
///
/// Implementations must be thread-safe and handle errors gracefully without
/// disrupting the application (cache failures should degrade to database lookups).
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves a cached link.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get_link(&self, slug: &str) -> CacheResult<Option<Link>>;

    /// Stores a link under its slug.
    ///
    /// `ttl_seconds` overrides the implementation default. Implementations
    /// never keep an entry past the link's expiration.
    async fn set_link(&self, link: &Link, ttl_seconds: Option<u64>) -> CacheResult<()>;

    /// Removes a cached link. Used when a link is edited or deleted.
    async fn invalidate(&self, slug: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}

/// TTL for a cache entry: the requested TTL capped at the link's remaining
/// lifetime. `None` means the link is already expired and must not be cached.
pub fn effective_ttl(ttl_seconds: u64, link: &Link, now: i64) -> Option<u64> {
    match link.remaining_lifetime(now) {
        None => Some(ttl_seconds),
        Some(remaining) if remaining <= 0 => None,
        Some(remaining) => Some(ttl_seconds.min(remaining as u64)),
    }
}
