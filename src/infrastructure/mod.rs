//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`analytics`] - ClickHouse access-log store and statistics SQL
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL link store

pub mod analytics;
pub mod cache;
pub mod persistence;
