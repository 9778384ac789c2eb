//! Access-log analytics store.
//!
//! - [`clickhouse`] - [`ClickHouseAnalytics`] repository over HTTP
//! - [`query_builder`] - Parameterized SQL for the statistics endpoints
//!
//! The table definition lives in `schema/clickhouse.sql`.

pub mod clickhouse;
pub mod query_builder;

pub use clickhouse::ClickHouseAnalytics;
