//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, effective_ttl};
use crate::domain::entities::Link;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache for resolved links, stored as JSON under `link:<slug>`.
///
/// Uses `ConnectionManager` for connection reuse.
/// All operations are fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!(
            "Connecting to Redis at {}",
            crate::config::mask_connection_string(redis_url)
        );

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, slug: &str) -> String {
        format!("{}{}", self.key_prefix, slug)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_link(&self, slug: &str) -> CacheResult<Option<Link>> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<Link>(&json) {
                Ok(link) => {
                    debug!("Cache HIT: {} -> {}", slug, link.url);
                    Ok(Some(link))
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry for {}: {}", slug, e);
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", slug);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", slug, e);
                Ok(None)
            }
        }
    }

    async fn set_link(&self, link: &Link, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let now = chrono::Utc::now().timestamp();
        let Some(ttl) = effective_ttl(ttl_seconds.unwrap_or(self.default_ttl), link, now) else {
            return Ok(());
        };

        let json = serde_json::to_string(link)
            .map_err(|e| CacheError::OperationError(format!("Failed to encode link: {}", e)))?;

        let key = self.build_key(&link.slug);
        let mut conn = self.client.clone();

        match conn.set_ex::<_, _, ()>(&key, json, ttl).await {
            Ok(_) => {
                debug!("Cache SET: {} -> {} (TTL: {}s)", link.slug, link.url, ttl);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", link.slug, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", slug);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", slug, e);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
