//! Access-log statistics service.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::domain::access_log::{LogField, LogSchema};
use crate::domain::repositories::{AnalyticsError, AnalyticsRepository, BoundQuery};
use crate::domain::stats::{Counters, MetricRow, StatsFilter, StatsQuery, ViewRow, is_metric_dimension};
use crate::error::AppError;
use crate::infrastructure::analytics::query_builder;

/// Service for querying aggregated access logs.
///
/// Builds parameterized statements against the configured dataset and
/// decodes the returned rows.
pub struct StatsService {
    repository: Arc<dyn AnalyticsRepository>,
    schema: Arc<LogSchema>,
    dataset: String,
}

impl StatsService {
    pub fn new(
        repository: Arc<dyn AnalyticsRepository>,
        schema: Arc<LogSchema>,
        dataset: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            schema,
            dataset: dataset.into(),
        }
    }

    /// The bound statement behind [`Self::views`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the schema lacks a referenced field.
    pub fn views_statement(&self, query: &StatsQuery) -> Result<BoundQuery, AppError> {
        Ok(query_builder::views(&self.dataset, &self.schema, query)?)
    }

    /// Visits and visitors per time bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the analytics query fails.
    pub async fn views(&self, query: &StatsQuery) -> Result<Vec<ViewRow>, AppError> {
        let statement = self.views_statement(query)?;
        let rows = self.repository.fetch_rows(statement).await?;
        Ok(decode_rows(rows)?)
    }

    /// Totals for the filtered range. An empty dataset yields zeros.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the analytics query fails.
    pub async fn counters(&self, filter: &StatsFilter) -> Result<Counters, AppError> {
        let statement = query_builder::counters(&self.dataset, &self.schema, filter)?;
        let rows = self.repository.fetch_rows(statement).await?;

        Ok(decode_rows::<Counters>(rows)?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    /// Top values of one dimension.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `dimension` cannot be broken down.
    /// Returns [`AppError::Internal`] if the analytics query fails.
    pub async fn metrics(
        &self,
        dimension: LogField,
        filter: &StatsFilter,
        limit: u32,
    ) -> Result<Vec<MetricRow>, AppError> {
        if !is_metric_dimension(dimension) {
            return Err(AppError::bad_request(
                "Unsupported metric type",
                json!({ "type": dimension.as_str() }),
            ));
        }

        let statement =
            query_builder::metrics(&self.dataset, &self.schema, dimension, filter, limit)?;
        let rows = self.repository.fetch_rows(statement).await?;
        Ok(decode_rows(rows)?)
    }

    /// Returns whether the analytics store is reachable.
    pub async fn health_check(&self) -> bool {
        self.repository.health_check().await
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Map<String, Value>>) -> Result<Vec<T>, AnalyticsError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row))
                .map_err(|e| AnalyticsError::Decode(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockAnalyticsRepository, QueryParam};
    use crate::domain::stats::TimeUnit;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn service(repo: MockAnalyticsRepository) -> StatsService {
        StatsService::new(Arc::new(repo), Arc::new(LogSchema::v1()), "sink")
    }

    #[tokio::test]
    async fn test_views_decodes_rows() {
        let mut repo = MockAnalyticsRepository::new();
        repo.expect_fetch_rows()
            .withf(|q| {
                q.param("dataset") == Some(&QueryParam::Identifier("sink".to_string()))
                    && q.param("client_timezone")
                        == Some(&QueryParam::String("Asia/Tokyo".to_string()))
            })
            .times(1)
            .returning(|_| {
                Ok(vec![
                    row(json!({ "time": "2026-10-01 09", "visits": "4", "visitors": "2" })),
                    row(json!({ "time": "2026-10-01 10", "visits": "1", "visitors": "1" })),
                ])
            });

        let query = StatsQuery::new(TimeUnit::Hour).with_timezone("Asia/Tokyo");
        let rows = service(repo).views(&query).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, "2026-10-01 09");
        assert_eq!(rows[0].visits, 4);
        assert_eq!(rows[0].visitors, 2);
    }

    #[tokio::test]
    async fn test_counters_default_to_zero() {
        let mut repo = MockAnalyticsRepository::new();
        repo.expect_fetch_rows().returning(|_| Ok(Vec::new()));

        let counters = service(repo).counters(&StatsFilter::new()).await.unwrap();
        assert_eq!(counters, Counters::default());
    }

    #[tokio::test]
    async fn test_metrics_rejects_ip() {
        let mut repo = MockAnalyticsRepository::new();
        repo.expect_fetch_rows().times(0);

        let err = service(repo)
            .metrics(LogField::Ip, &StatsFilter::new(), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_metrics_decodes_rows() {
        let mut repo = MockAnalyticsRepository::new();
        repo.expect_fetch_rows()
            .withf(|q| q.sql.contains("blob6 AS name"))
            .returning(|_| Ok(vec![row(json!({ "name": "DE", "count": 7 }))]));

        let rows = service(repo)
            .metrics(LogField::Country, &StatsFilter::new(), 10)
            .await
            .unwrap();
        assert_eq!(rows, vec![MetricRow { name: "DE".to_string(), count: 7 }]);
    }

    #[tokio::test]
    async fn test_malformed_rows_are_internal_errors() {
        let mut repo = MockAnalyticsRepository::new();
        repo.expect_fetch_rows()
            .returning(|_| Ok(vec![row(json!({ "time": 1 }))]));

        let err = service(repo)
            .views(&StatsQuery::new(TimeUnit::Day))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_engine_failure_is_internal_error() {
        let mut repo = MockAnalyticsRepository::new();
        repo.expect_fetch_rows().returning(|_| {
            Err(AnalyticsError::Engine {
                status: 500,
                body: "boom".to_string(),
            })
        });

        let err = service(repo)
            .counters(&StatsFilter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
