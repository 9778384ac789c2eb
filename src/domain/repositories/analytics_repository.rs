//! Repository trait for the access-log analytics store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Errors from the analytics store.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("analytics request failed: {0}")]
    Transport(String),
    #[error("analytics engine returned {status}: {body}")]
    Engine { status: u16, body: String },
    #[error("unexpected analytics response: {0}")]
    Decode(String),
}

/// A typed value bound to a named query placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    String(String),
    Int64(i64),
    Identifier(String),
}

impl QueryParam {
    /// Engine type name used in `{name:Type}` placeholders.
    pub fn type_name(&self) -> &'static str {
        match self {
            QueryParam::String(_) => "String",
            QueryParam::Int64(_) => "Int64",
            QueryParam::Identifier(_) => "Identifier",
        }
    }
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryParam::String(v) | QueryParam::Identifier(v) => f.write_str(v),
            QueryParam::Int64(v) => write!(f, "{v}"),
        }
    }
}

/// SQL text with named placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<(String, QueryParam)>,
}

impl BoundQuery {
    /// Looks up a bound parameter by name.
    pub fn param(&self, name: &str) -> Option<&QueryParam> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }
}

/// Write and query access to the analytics store.
///
/// # Implementations
///
/// - [`crate::infrastructure::analytics::ClickHouseAnalytics`] - ClickHouse over HTTP
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Writes one data point: a single index value and the encoded blobs.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the store rejects or cannot receive the row.
    async fn write(&self, index: &str, blobs: Vec<String>) -> Result<(), AnalyticsError>;

    /// Executes a bound query and returns its rows as JSON objects.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] on transport, engine or decoding failures.
    async fn fetch_rows(&self, query: BoundQuery) -> Result<Vec<Map<String, Value>>, AnalyticsError>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> bool;
}
