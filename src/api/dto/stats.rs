//! DTOs for statistics endpoints.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::domain::access_log::LogField;
use crate::domain::stats::{DEFAULT_TIMEZONE, StatsFilter, StatsQuery, TimeUnit};
use crate::error::AppError;

/// IANA-style zone names such as `Etc/UTC` or `America/Argentina/Buenos_Aires`.
static TIMEZONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_+\-]*(/[A-Za-z0-9_+\-]+)*$").expect("valid timezone regex")
});

/// Default number of rows returned by `GET /api/stats/metrics`.
pub const DEFAULT_METRICS_LIMIT: u32 = 10;

/// Query parameters shared by the statistics endpoints.
///
/// Filters are optional equality predicates; `unit` and `clientTimezone`
/// apply to views, `type` and `limit` to metrics.
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    #[validate(length(max = 64), regex(path = "*TIMEZONE_REGEX"))]
    pub client_timezone: Option<String>,

    #[serde(default, rename = "type")]
    pub metric_type: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = 1024))]
    pub limit: Option<u32>,

    /// Link id, matched against the row index.
    #[serde(default)]
    pub id: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub start_at: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub end_at: Option<i64>,

    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl StatsParams {
    /// Builds the filter shared by every statistics query.
    pub fn filter(&self) -> StatsFilter {
        StatsFilter::new()
            .with_link_id(self.id.clone())
            .with_time_range(self.start_at, self.end_at)
            .with_dimension(LogField::Slug, self.slug.clone())
            .with_dimension(LogField::Country, self.country.clone())
            .with_dimension(LogField::Os, self.os.clone())
            .with_dimension(LogField::Browser, self.browser.clone())
            .with_dimension(LogField::DeviceType, self.device_type.clone())
            .with_dimension(LogField::Source, self.source.clone())
    }

    /// Builds a views query.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `unit` is missing or unsupported.
    pub fn views_query(&self) -> Result<StatsQuery, AppError> {
        let unit = self.unit.as_deref().ok_or_else(|| {
            AppError::bad_request("Missing time unit", serde_json::json!({ "field": "unit" }))
        })?;
        let unit: TimeUnit = unit.parse()?;

        let timezone = self
            .client_timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        Ok(StatsQuery::new(unit)
            .with_timezone(timezone)
            .with_filter(self.filter()))
    }

    /// The dimension requested from the metrics endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `type` is missing or names no field.
    pub fn metric_dimension(&self) -> Result<LogField, AppError> {
        let name = self.metric_type.as_deref().ok_or_else(|| {
            AppError::bad_request("Missing metric type", serde_json::json!({ "field": "type" }))
        })?;
        Ok(name.parse()?)
    }

    pub fn metrics_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_METRICS_LIMIT)
    }
}

/// Envelope of every statistics response.
#[derive(Debug, Serialize)]
pub struct StatsResponse<T> {
    pub data: T,
}
