#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo, middleware, routing::get};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::Layer;

use sink::api::handlers::{health_handler, redirect_handler};
use sink::api::middleware::auth;
use sink::api::routes::protected_routes;
use sink::config::{AnalyticsConfig, AppEnv, Config, DEFAULT_SLUG_REGEX};
use sink::domain::entities::Link;
use sink::domain::repositories::{AnalyticsError, AnalyticsRepository, BoundQuery, LinkRepository};
use sink::error::AppError;
use sink::infrastructure::cache::NullCache;
use sink::state::AppState;

pub const SITE_TOKEN: &str = "integration-site-token";
pub const BASE_URL: &str = "https://s.example";

/// Link store backed by an ordered map.
pub struct InMemoryLinkRepository {
    links: Mutex<BTreeMap<String, Link>>,
    pub healthy: AtomicBool,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: Mutex::default(),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn insert(&self, link: Link) {
        self.links.lock().unwrap().insert(link.slug.clone(), link);
    }

    pub fn get(&self, slug: &str) -> Option<Link> {
        self.links.lock().unwrap().get(slug).cloned()
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, link: Link) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&link.slug) {
            return Err(AppError::conflict(
                "Link already exists",
                serde_json::json!({ "slug": link.slug }),
            ));
        }
        links.insert(link.slug.clone(), link.clone());
        Ok(link)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        Ok(self.get(slug))
    }

    async fn update(&self, link: Link) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        match links.get_mut(&link.slug) {
            Some(existing) => {
                *existing = link.clone();
                Ok(link)
            }
            None => Err(AppError::not_found(
                "Link not found",
                serde_json::json!({ "slug": link.slug }),
            )),
        }
    }

    async fn delete(&self, slug: &str) -> Result<bool, AppError> {
        Ok(self.links.lock().unwrap().remove(slug).is_some())
    }

    async fn list(&self, limit: i64, cursor: Option<String>) -> Result<Vec<Link>, AppError> {
        let links = self.links.lock().unwrap();
        Ok(links
            .values()
            .filter(|l| cursor.as_ref().is_none_or(|c| l.slug.as_str() > c.as_str()))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

/// Analytics store that records writes and queries and replays canned rows.
#[derive(Default)]
pub struct RecordingAnalytics {
    pub writes: Mutex<Vec<(String, Vec<String>)>>,
    pub queries: Mutex<Vec<BoundQuery>>,
    pub rows: Mutex<Vec<Map<String, Value>>>,
    pub fail_writes: AtomicBool,
    pub write_attempts: AtomicUsize,
}

impl RecordingAnalytics {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// A sink whose writes always fail with a transport error.
    pub fn failing() -> Self {
        Self {
            fail_writes: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Waits for a detached write to be attempted, successful or not.
    pub async fn wait_for_attempts(&self, count: usize) -> usize {
        for _ in 0..100 {
            if self.write_attempts() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.write_attempts()
    }

    pub fn writes(&self) -> Vec<(String, Vec<String>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> Option<BoundQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    /// Waits for a detached access-log write to land.
    pub async fn wait_for_writes(&self, count: usize) -> Vec<(String, Vec<String>)> {
        for _ in 0..100 {
            let writes = self.writes();
            if writes.len() >= count {
                return writes;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.writes()
    }
}

#[async_trait]
impl AnalyticsRepository for RecordingAnalytics {
    async fn write(&self, index: &str, blobs: Vec<String>) -> Result<(), AnalyticsError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AnalyticsError::Transport("connection refused".to_string()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((index.to_string(), blobs));
        Ok(())
    }

    async fn fetch_rows(&self, query: BoundQuery) -> Result<Vec<Map<String, Value>>, AnalyticsError> {
        self.queries.lock().unwrap().push(query);
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub fn test_config(app_env: AppEnv) -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        redis_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: BASE_URL.to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        app_env,
        behind_proxy: true,
        cache_ttl_seconds: 3600,
        site_token: SITE_TOKEN.to_string(),
        slug_regex: DEFAULT_SLUG_REGEX.to_string(),
        slug_default_length: 6,
        slug_case_sensitive: false,
        redirect_status_code: 301,
        analytics: AnalyticsConfig {
            url: "http://localhost:8123".to_string(),
            database: "default".to_string(),
            dataset: "sink".to_string(),
            user: None,
            password: None,
        },
        db_max_connections: 10,
        db_connect_timeout: 30,
        db_idle_timeout: 600,
        db_max_lifetime: 1800,
    }
}

pub struct TestContext {
    pub state: AppState,
    pub links: Arc<InMemoryLinkRepository>,
    pub analytics: Arc<RecordingAnalytics>,
}

pub fn create_test_context(config: &Config, analytics: RecordingAnalytics) -> TestContext {
    let links = Arc::new(InMemoryLinkRepository::new());
    let analytics = Arc::new(analytics);

    let state = AppState::build(
        config,
        links.clone(),
        Arc::new(NullCache::new()),
        analytics.clone(),
    )
    .unwrap();

    TestContext {
        state,
        links,
        analytics,
    }
}

pub fn create_test_state() -> TestContext {
    create_test_context(
        &test_config(AppEnv::Production),
        RecordingAnalytics::default(),
    )
}

/// The application routes with a fixed peer address.
pub fn test_app(state: AppState) -> Router {
    let api = protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/{slug}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(MockConnectInfoLayer)
        .with_state(state)
}

pub fn link(slug: &str, url: &str) -> Link {
    Link {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        url: url.to_string(),
        created_at: 1_700_000_000,
        updated_at: 1_700_000_000,
        expiration: None,
        title: None,
        description: None,
        image: None,
        comment: None,
    }
}

pub fn bearer() -> String {
    format!("Bearer {SITE_TOKEN}")
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
