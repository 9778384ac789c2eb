//! Statistics query model and result rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::domain::access_log::LogField;

/// Default timezone used to bucket timestamps.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Granularity of time buckets in view statistics.
///
/// Only hourly and daily buckets are supported; anything else, including
/// `minute`, is rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    Day,
}

impl TimeUnit {
    /// strftime-style pattern applied to `timestamp` for this bucket size.
    pub fn format(self) -> &'static str {
        match self {
            TimeUnit::Hour => "%Y-%m-%d %H",
            TimeUnit::Day => "%Y-%m-%d",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported time unit '{0}', expected 'hour' or 'day'")]
pub struct UnsupportedTimeUnit(pub String);

impl FromStr for TimeUnit {
    type Err = UnsupportedTimeUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(TimeUnit::Hour),
            "day" => Ok(TimeUnit::Day),
            other => Err(UnsupportedTimeUnit(other.to_string())),
        }
    }
}

/// Dimensions accepted as equality filters on statistics queries.
pub const FILTERABLE_DIMENSIONS: [LogField; 6] = [
    LogField::Slug,
    LogField::Country,
    LogField::Os,
    LogField::Browser,
    LogField::DeviceType,
    LogField::Source,
];

/// Whether a field may be broken down by the metrics query.
///
/// Client addresses are only ever counted, never listed.
pub fn is_metric_dimension(field: LogField) -> bool {
    field != LogField::Ip
}

/// Predicates shared by all statistics queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsFilter {
    /// Link id, matched against the index dimension.
    pub link_id: Option<String>,
    /// Inclusive lower bound, unix seconds.
    pub start_at: Option<i64>,
    /// Inclusive upper bound, unix seconds.
    pub end_at: Option<i64>,
    pub dimensions: Vec<(LogField, String)>,
}

impl StatsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link_id(mut self, link_id: Option<String>) -> Self {
        self.link_id = link_id;
        self
    }

    pub fn with_time_range(mut self, start_at: Option<i64>, end_at: Option<i64>) -> Self {
        self.start_at = start_at;
        self.end_at = end_at;
        self
    }

    /// Adds an equality predicate on a dimension; empty values are ignored.
    pub fn with_dimension(mut self, field: LogField, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.dimensions.push((field, value));
        }
        self
    }
}

/// Time-bucketed views query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub unit: TimeUnit,
    pub client_timezone: String,
    pub filter: StatsFilter,
}

impl StatsQuery {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            client_timezone: DEFAULT_TIMEZONE.to_string(),
            filter: StatsFilter::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.client_timezone = timezone.into();
        self
    }

    pub fn with_filter(mut self, filter: StatsFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// One time bucket of the views query.
///
/// The analytics engine may quote 64-bit integers in JSON output, so counts
/// accept both numbers and numeric strings.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    pub time: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub visits: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub visitors: u64,
}

/// Totals over the filtered range.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub visits: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub visitors: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub referers: u64,
}

/// One value of a dimension breakdown.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRow {
    pub name: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_unit_formats() {
        assert_eq!("hour".parse::<TimeUnit>().unwrap().format(), "%Y-%m-%d %H");
        assert_eq!("day".parse::<TimeUnit>().unwrap().format(), "%Y-%m-%d");
    }

    #[test]
    fn test_minute_is_rejected() {
        let err = "minute".parse::<TimeUnit>().unwrap_err();
        assert_eq!(err, UnsupportedTimeUnit("minute".to_string()));
        assert!(err.to_string().contains("'minute'"));
    }

    #[test]
    fn test_ip_is_not_a_metric_dimension() {
        assert!(!is_metric_dimension(LogField::Ip));
        assert!(is_metric_dimension(LogField::Country));
    }

    #[test]
    fn test_query_defaults_to_utc() {
        let query = StatsQuery::new(TimeUnit::Day);
        assert_eq!(query.client_timezone, "Etc/UTC");
        assert_eq!(query.filter, StatsFilter::default());
    }

    #[test]
    fn test_filter_skips_empty_dimension_values() {
        let filter = StatsFilter::new()
            .with_dimension(LogField::Country, Some("DE".to_string()))
            .with_dimension(LogField::Os, Some(String::new()))
            .with_dimension(LogField::Browser, None);

        assert_eq!(filter.dimensions, vec![(LogField::Country, "DE".to_string())]);
    }

    #[test]
    fn test_rows_accept_quoted_counts() {
        let row: ViewRow = serde_json::from_value(serde_json::json!({
            "time": "2026-10-01 13",
            "visits": "12",
            "visitors": 3
        }))
        .unwrap();

        assert_eq!(row.visits, 12);
        assert_eq!(row.visitors, 3);
    }
}
