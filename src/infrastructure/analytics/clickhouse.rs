//! ClickHouse access-log store over the HTTP interface.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::AnalyticsConfig;
use crate::domain::repositories::{AnalyticsError, AnalyticsRepository, BoundQuery};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Analytics repository backed by a ClickHouse server.
///
/// Rows are inserted with `JSONEachRow`; queries send their SQL as the
/// request body and their parameters as `param_<name>` URL parameters.
pub struct ClickHouseAnalytics {
    client: Client,
    endpoint: Url,
    database: String,
    dataset: String,
    user: Option<String>,
    password: Option<String>,
}

impl ClickHouseAnalytics {
    /// Builds the HTTP client. Does not contact the server.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Transport`] if the endpoint URL is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let endpoint = Url::parse(&config.url)
            .map_err(|e| AnalyticsError::Transport(format!("invalid ANALYTICS_URL: {e}")))?;

        let client = Client::builder()
            .user_agent(concat!("sink/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AnalyticsError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            database: config.database.clone(),
            dataset: config.dataset.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    fn url_with(&self, pairs: &[(String, String)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in pairs {
                query.append_pair(k, v);
            }
        }
        url
    }

    async fn post(&self, url: Url, body: String) -> Result<Response, AnalyticsError> {
        let mut request = self.client.post(url).body(body);
        if let Some(ref user) = self.user {
            request = request.basic_auth(user, self.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalyticsError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::Engine {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(response)
    }
}

/// One `JSONEachRow` line for the access-log table.
pub fn insert_row(index: &str, blobs: &[String], timestamp: i64) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("index1".to_string(), json!(index));
    for (i, blob) in blobs.iter().enumerate() {
        row.insert(format!("blob{}", i + 1), json!(blob));
    }
    row.insert("timestamp".to_string(), json!(timestamp));
    row.insert("_sample_interval".to_string(), json!(1));
    row
}

/// URL parameters carrying a bound query's values.
pub fn query_params(query: &BoundQuery) -> Vec<(String, String)> {
    query
        .params
        .iter()
        .map(|(name, value)| (format!("param_{name}"), value.to_string()))
        .collect()
}

/// Parses a `JSONEachRow` response body.
///
/// # Errors
///
/// Returns [`AnalyticsError::Decode`] if a line is not a JSON object.
pub fn parse_rows(body: &str) -> Result<Vec<Map<String, Value>>, AnalyticsError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(row)) => Ok(row),
            Ok(other) => Err(AnalyticsError::Decode(format!("expected object, got {other}"))),
            Err(e) => Err(AnalyticsError::Decode(e.to_string())),
        })
        .collect()
}

#[async_trait]
impl AnalyticsRepository for ClickHouseAnalytics {
    async fn write(&self, index: &str, blobs: Vec<String>) -> Result<(), AnalyticsError> {
        let row = insert_row(index, &blobs, chrono::Utc::now().timestamp());
        let body =
            serde_json::to_string(&row).map_err(|e| AnalyticsError::Decode(e.to_string()))?;

        // database and dataset are validated as plain identifiers at startup
        let insert = format!(
            "INSERT INTO `{}`.`{}` FORMAT JSONEachRow",
            self.database, self.dataset
        );
        let url = self.url_with(&[("query".to_string(), insert)]);

        self.post(url, body).await?;
        debug!("Access log written for {}", index);
        Ok(())
    }

    async fn fetch_rows(
        &self,
        query: BoundQuery,
    ) -> Result<Vec<Map<String, Value>>, AnalyticsError> {
        let mut pairs = vec![
            ("database".to_string(), self.database.clone()),
            ("default_format".to_string(), "JSONEachRow".to_string()),
        ];
        pairs.extend(query_params(&query));

        let url = self.url_with(&pairs);
        let response = self.post(url, query.sql).await?;
        let body = response
            .text()
            .await
            .map_err(|e| AnalyticsError::Transport(e.to_string()))?;

        parse_rows(&body)
    }

    async fn health_check(&self) -> bool {
        let Ok(url) = self.endpoint.join("ping") else {
            return false;
        };

        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Analytics ping failed: {}", e);
                false
            }
        }
    }
}
