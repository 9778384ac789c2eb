//! SQL for the statistics endpoints.
//!
//! Statements use ClickHouse query parameters (`{name:Type}`) for every value
//! that comes from a request or from configuration. Only column names are
//! written into the SQL text, and those come from the [`LogSchema`].

use crate::domain::access_log::{LogField, LogSchema, SchemaError};
use crate::domain::repositories::{BoundQuery, QueryParam};
use crate::domain::stats::{StatsFilter, StatsQuery};

/// Column holding the link id.
const INDEX_COLUMN: &str = "index1";

/// Accumulates SQL fragments and their bound parameters.
#[derive(Default)]
struct Statement {
    params: Vec<(String, QueryParam)>,
}

impl Statement {
    /// Binds `value` under `name` and returns its placeholder.
    fn bind(&mut self, name: impl Into<String>, value: QueryParam) -> String {
        let name = name.into();
        let placeholder = format!("{{{}:{}}}", name, value.type_name());
        self.params.push((name, value));
        placeholder
    }

    fn dataset(&mut self, dataset: &str) -> String {
        self.bind("dataset", QueryParam::Identifier(dataset.to_string()))
    }

    /// `WHERE` clause for `filter` plus any extra predicates, or an empty string.
    fn where_clause(
        &mut self,
        schema: &LogSchema,
        filter: &StatsFilter,
        extra: &[String],
    ) -> Result<String, SchemaError> {
        let mut predicates = Vec::new();

        if let Some(ref id) = filter.link_id {
            let p = self.bind("link_id", QueryParam::String(id.clone()));
            predicates.push(format!("{INDEX_COLUMN} = {p}"));
        }
        if let Some(start) = filter.start_at {
            let p = self.bind("start_at", QueryParam::Int64(start));
            predicates.push(format!("timestamp >= toDateTime({p})"));
        }
        if let Some(end) = filter.end_at {
            let p = self.bind("end_at", QueryParam::Int64(end));
            predicates.push(format!("timestamp <= toDateTime({p})"));
        }
        for (i, (field, value)) in filter.dimensions.iter().enumerate() {
            let column = schema.column_of(*field)?;
            let p = self.bind(format!("dim{i}"), QueryParam::String(value.clone()));
            predicates.push(format!("{column} = {p}"));
        }
        predicates.extend(extra.iter().cloned());

        if predicates.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" WHERE {}", predicates.join(" AND ")))
        }
    }

    fn finish(self, sql: String) -> BoundQuery {
        BoundQuery {
            sql,
            params: self.params,
        }
    }
}

/// Visits and distinct visitors per time bucket, oldest bucket first.
///
/// # Errors
///
/// Returns [`SchemaError::UnmappedField`] if the schema lacks the `ip` field
/// or a filtered dimension.
pub fn views(
    dataset: &str,
    schema: &LogSchema,
    query: &StatsQuery,
) -> Result<BoundQuery, SchemaError> {
    let ip = schema.column_of(LogField::Ip)?;
    let mut stmt = Statement::default();

    let format = stmt.bind(
        "unit_format",
        QueryParam::String(query.unit.format().to_string()),
    );
    let timezone = stmt.bind(
        "client_timezone",
        QueryParam::String(query.client_timezone.clone()),
    );
    let table = stmt.dataset(dataset);
    let filter = stmt.where_clause(schema, &query.filter, &[])?;

    let sql = format!(
        "SELECT formatDateTime(timestamp, {format}, {timezone}) AS time, \
         SUM(_sample_interval) AS visits, \
         COUNT(DISTINCT {ip}) AS visitors \
         FROM {table}{filter} \
         GROUP BY time \
         ORDER BY time ASC"
    );

    Ok(stmt.finish(sql))
}

/// Total visits, distinct visitors and distinct referring hosts.
///
/// # Errors
///
/// Returns [`SchemaError::UnmappedField`] if the schema lacks `ip`, `source`
/// or a filtered dimension.
pub fn counters(
    dataset: &str,
    schema: &LogSchema,
    filter: &StatsFilter,
) -> Result<BoundQuery, SchemaError> {
    let ip = schema.column_of(LogField::Ip)?;
    let source = schema.column_of(LogField::Source)?;
    let mut stmt = Statement::default();

    let table = stmt.dataset(dataset);
    let filter = stmt.where_clause(schema, filter, &[])?;

    let sql = format!(
        "SELECT SUM(_sample_interval) AS visits, \
         COUNT(DISTINCT {ip}) AS visitors, \
         COUNT(DISTINCT nullIf({source}, '')) AS referers \
         FROM {table}{filter}"
    );

    Ok(stmt.finish(sql))
}

/// Most frequent values of `dimension`, by visit count descending.
///
/// Empty values are skipped. Ties are ordered by value.
///
/// # Errors
///
/// Returns [`SchemaError::UnmappedField`] if the schema lacks `dimension` or a
/// filtered dimension.
pub fn metrics(
    dataset: &str,
    schema: &LogSchema,
    dimension: LogField,
    filter: &StatsFilter,
    limit: u32,
) -> Result<BoundQuery, SchemaError> {
    let column = schema.column_of(dimension)?;
    let mut stmt = Statement::default();

    let table = stmt.dataset(dataset);
    let filter = stmt.where_clause(schema, filter, &[format!("{column} != ''")])?;
    let limit = stmt.bind("limit", QueryParam::Int64(i64::from(limit)));

    let sql = format!(
        "SELECT {column} AS name, \
         SUM(_sample_interval) AS count \
         FROM {table}{filter} \
         GROUP BY name \
         ORDER BY count DESC, name ASC \
         LIMIT {limit}"
    );

    Ok(stmt.finish(sql))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stats::TimeUnit;

    fn schema() -> LogSchema {
        LogSchema::v1()
    }

    #[test]
    fn test_views_hour_with_timezone() {
        let query = StatsQuery::new(TimeUnit::Hour).with_timezone("Europe/Berlin");
        let bound = views("sink", &schema(), &query).unwrap();

        assert_eq!(
            bound.sql,
            "SELECT formatDateTime(timestamp, {unit_format:String}, {client_timezone:String}) AS time, \
             SUM(_sample_interval) AS visits, COUNT(DISTINCT blob4) AS visitors \
             FROM {dataset:Identifier} GROUP BY time ORDER BY time ASC"
        );
        assert_eq!(
            bound.param("unit_format"),
            Some(&QueryParam::String("%Y-%m-%d %H".to_string()))
        );
        assert_eq!(
            bound.param("client_timezone"),
            Some(&QueryParam::String("Europe/Berlin".to_string()))
        );
        assert_eq!(
            bound.param("dataset"),
            Some(&QueryParam::Identifier("sink".to_string()))
        );
    }

    #[test]
    fn test_views_day_format() {
        let bound = views("sink", &schema(), &StatsQuery::new(TimeUnit::Day)).unwrap();
        assert_eq!(
            bound.param("unit_format"),
            Some(&QueryParam::String("%Y-%m-%d".to_string()))
        );
        assert_eq!(
            bound.param("client_timezone"),
            Some(&QueryParam::String("Etc/UTC".to_string()))
        );
    }

    #[test]
    fn test_views_with_filters() {
        let filter = StatsFilter::new()
            .with_link_id(Some("n8wdo5mnzq".to_string()))
            .with_time_range(Some(1_700_000_000), Some(1_700_086_400))
            .with_dimension(LogField::Country, Some("DE".to_string()));
        let query = StatsQuery::new(TimeUnit::Day).with_filter(filter);

        let bound = views("sink", &schema(), &query).unwrap();

        assert!(bound.sql.contains(
            " WHERE index1 = {link_id:String} \
             AND timestamp >= toDateTime({start_at:Int64}) \
             AND timestamp <= toDateTime({end_at:Int64}) \
             AND blob6 = {dim0:String} GROUP BY time"
        ));
        assert_eq!(bound.param("start_at"), Some(&QueryParam::Int64(1_700_000_000)));
        assert_eq!(bound.param("dim0"), Some(&QueryParam::String("DE".to_string())));
    }

    #[test]
    fn test_hostile_values_never_reach_sql_text() {
        let hostile = "x') OR 1=1; DROP TABLE sink; --";
        let filter = StatsFilter::new()
            .with_link_id(Some(hostile.to_string()))
            .with_dimension(LogField::Os, Some(hostile.to_string()));
        let query = StatsQuery::new(TimeUnit::Hour)
            .with_timezone(hostile)
            .with_filter(filter);

        let bound = views("sink", &schema(), &query).unwrap();

        assert!(!bound.sql.contains("DROP"));
        assert!(!bound.sql.contains("sink"));
        assert_eq!(
            bound.param("client_timezone"),
            Some(&QueryParam::String(hostile.to_string()))
        );
    }

    #[test]
    fn test_ip_column_follows_schema() {
        let custom = LogSchema::new(2, [("blob1", LogField::Ip), ("blob2", LogField::Slug)]).unwrap();
        let bound = views("sink", &custom, &StatsQuery::new(TimeUnit::Day)).unwrap();
        assert!(bound.sql.contains("COUNT(DISTINCT blob1) AS visitors"));
    }

    #[test]
    fn test_views_requires_ip_field() {
        let custom = LogSchema::new(1, [("blob1", LogField::Slug)]).unwrap();
        let err = views("sink", &custom, &StatsQuery::new(TimeUnit::Day)).unwrap_err();
        assert_eq!(err, SchemaError::UnmappedField(LogField::Ip));
    }

    #[test]
    fn test_counters() {
        let filter = StatsFilter::new().with_link_id(Some("abc".to_string()));
        let bound = counters("sink", &schema(), &filter).unwrap();

        assert_eq!(
            bound.sql,
            "SELECT SUM(_sample_interval) AS visits, COUNT(DISTINCT blob4) AS visitors, \
             COUNT(DISTINCT nullIf(blob5, '')) AS referers \
             FROM {dataset:Identifier} WHERE index1 = {link_id:String}"
        );
    }

    #[test]
    fn test_metrics() {
        let bound = metrics("sink", &schema(), LogField::Browser, &StatsFilter::new(), 10).unwrap();

        assert_eq!(
            bound.sql,
            "SELECT blob12 AS name, SUM(_sample_interval) AS count \
             FROM {dataset:Identifier} WHERE blob12 != '' \
             GROUP BY name ORDER BY count DESC, name ASC LIMIT {limit:Int64}"
        );
        assert_eq!(bound.param("limit"), Some(&QueryParam::Int64(10)));
    }

    #[test]
    fn test_metrics_combines_filter_and_non_empty_predicate() {
        let filter = StatsFilter::new().with_dimension(LogField::DeviceType, Some("mobile".to_string()));
        let bound = metrics("sink", &schema(), LogField::Os, &filter, 5).unwrap();

        assert!(bound.sql.contains("WHERE blob15 = {dim0:String} AND blob11 != ''"));
    }
}
