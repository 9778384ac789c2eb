//! Business logic services for the application layer.

pub mod access_log_service;
pub mod link_service;
pub mod stats_service;

pub use access_log_service::AccessLogService;
pub use link_service::{LinkService, SlugPolicy};
pub use stats_service::StatsService;
