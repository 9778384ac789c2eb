//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the two external stores the service talks to and are
//! implemented in `crate::infrastructure`.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Short link records
//! - [`AnalyticsRepository`] - Access-log writes and statistics queries
//!
//! Mock implementations are generated via `mockall` for unit tests.

pub mod analytics_repository;
pub mod link_repository;

pub use analytics_repository::{AnalyticsError, AnalyticsRepository, BoundQuery, QueryParam};
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
