//! Shared application state injected into every handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use sha2::{Digest, Sha256};

use crate::application::services::{AccessLogService, LinkService, SlugPolicy, StatsService};
use crate::config::Config;
use crate::domain::access_log::{LogCodec, LogSchema};
use crate::domain::repositories::{AnalyticsRepository, LinkRepository};
use crate::infrastructure::cache::CacheService;
use crate::utils::request_signals::SignalExtractor;
use crate::utils::user_agent::UserAgentClassifier;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub access_log: Arc<AccessLogService>,
    pub stats_service: Arc<StatsService>,
    pub signals: Arc<SignalExtractor>,
    pub cache: Arc<dyn CacheService>,
    /// Public origin used to build `shortLink` values.
    pub base_url: String,
    pub redirect_status: StatusCode,
    /// SHA-256 of the API bearer token.
    pub site_token_hash: [u8; 32],
}

impl AppState {
    /// Wires services from configuration and the storage backends.
    ///
    /// Every service shares the v1 access-log schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the slug pattern or redirect status is invalid.
    pub fn build(
        config: &Config,
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        analytics: Arc<dyn AnalyticsRepository>,
    ) -> Result<Self> {
        let policy = SlugPolicy::new(
            &config.slug_regex,
            config.slug_default_length,
            config.slug_case_sensitive,
        )
        .context("Invalid SLUG_REGEX")?;

        let redirect_status = StatusCode::from_u16(config.redirect_status_code)
            .context("Invalid REDIRECT_STATUS_CODE")?;

        let schema = Arc::new(LogSchema::v1());

        let link_service = LinkService::new(links, cache.clone(), policy);
        let access_log = AccessLogService::new(
            LogCodec::new(schema.clone()),
            analytics.clone(),
            config.app_env,
        );
        let stats_service = StatsService::new(analytics, schema, config.analytics.dataset.clone());
        let signals = SignalExtractor::new(
            Arc::new(UserAgentClassifier::standard()),
            config.behind_proxy,
        );

        Ok(Self {
            link_service: Arc::new(link_service),
            access_log: Arc::new(access_log),
            stats_service: Arc::new(stats_service),
            signals: Arc::new(signals),
            cache,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            redirect_status,
            site_token_hash: hash_token(&config.site_token),
        })
    }

    /// Checks a presented bearer token against the configured one.
    pub fn is_site_token(&self, token: &str) -> bool {
        hash_token(token) == self.site_token_hash
    }
}

pub fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
