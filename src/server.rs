//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, the analytics client and the
//! Axum server lifecycle.

use crate::config::Config;
use crate::infrastructure::analytics::ClickHouseAnalytics;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::PgLinkRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - ClickHouse analytics client
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The analytics client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = connect_cache(&config).await;

    let analytics = ClickHouseAnalytics::new(&config.analytics)
        .context("Failed to build analytics client")?;
    tracing::info!(
        "Analytics sink: {} ({}, {})",
        config.analytics.url,
        config.analytics.database,
        analytics.dataset()
    );
    if !config.app_env.is_production() {
        tracing::info!("Access logs are echoed, not persisted (APP_ENV={})", config.app_env);
    }

    let links = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let state = AppState::build(&config, links, cache, Arc::new(analytics))?;

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if no connection can be established.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

async fn shutdown_signal() {
    wait_for_shutdown(signal::ctrl_c()).await
}

/// Resolves once `signal` fires.
///
/// A listener that cannot be installed never triggers shutdown; the server
/// keeps running until it is stopped some other way.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {}. Graceful shutdown disabled.", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn test_shutdown_on_signal() {
        let result =
            tokio::time::timeout(Duration::from_millis(100), wait_for_shutdown(async { Ok(()) }))
                .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_failed_listener_does_not_shut_down() {
        let failing = async { Err(io::Error::other("no signal handler")) };
        let result =
            tokio::time::timeout(Duration::from_millis(100), wait_for_shutdown(failing)).await;
        assert!(result.is_err());
    }
}
