//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide a clean API for HTTP
//! handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link management and redirect resolution
//! - [`services::access_log_service::AccessLogService`] - Access-log encoding and persistence
//! - [`services::stats_service::StatsService`] - Access-log statistics

pub mod services;
