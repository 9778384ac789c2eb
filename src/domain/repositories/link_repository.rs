//! Repository trait for short link data access.

use crate::domain::entities::Link;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for link records, keyed by slug.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug or id is already taken.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, link: Link) -> Result<Link, AppError>;

    /// Finds a link by slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError>;

    /// Replaces the stored link with the same slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this slug.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update(&self, link: Link) -> Result<Link, AppError>;

    /// Deletes a link. Returns `Ok(false)` if the slug was unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn delete(&self, slug: &str) -> Result<bool, AppError>;

    /// Lists up to `limit` links with slugs strictly greater than `cursor`,
    /// in slug order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list(&self, limit: i64, cursor: Option<String>) -> Result<Vec<Link>, AppError>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> bool;
}
