//! PostgreSQL repository implementations.
//!
//! Queries are built at runtime with bound parameters; the schema lives in
//! `migrations/` and is applied on startup.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage and retrieval

pub mod pg_link_repository;

pub use pg_link_repository::PgLinkRepository;
