//! Link management and resolution service.

use std::sync::Arc;

use regex::Regex;
use serde_json::json;

use crate::domain::entities::{Link, LinkPage, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::slug_generator::{generate_id, generate_slug};

/// Maximum slug length accepted from clients.
pub const MAX_SLUG_LENGTH: usize = 2048;

/// Attempts at finding an unused random slug before giving up.
const MAX_SLUG_ATTEMPTS: usize = 10;

/// Slug rules: allowed pattern, generated length and case handling.
#[derive(Debug, Clone)]
pub struct SlugPolicy {
    pattern: Regex,
    default_length: usize,
    case_sensitive: bool,
}

impl SlugPolicy {
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn new(
        pattern: &str,
        default_length: usize,
        case_sensitive: bool,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            default_length,
            case_sensitive,
        })
    }

    /// Trims and, for case-insensitive deployments, lowercases a slug.
    pub fn normalize(&self, slug: &str) -> String {
        let slug = slug.trim();
        if self.case_sensitive {
            slug.to_string()
        } else {
            slug.to_lowercase()
        }
    }

    /// Checks a normalized slug against the length limit and pattern.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the slug is rejected.
    pub fn validate(&self, slug: &str) -> Result<(), AppError> {
        if slug.is_empty() || slug.len() > MAX_SLUG_LENGTH {
            return Err(AppError::bad_request(
                format!("Slug must be 1-{MAX_SLUG_LENGTH} characters"),
                json!({ "provided_length": slug.len() }),
            ));
        }

        if !self.pattern.is_match(slug) {
            return Err(AppError::bad_request(
                "Slug does not match the allowed pattern",
                json!({ "slug": slug, "pattern": self.pattern.as_str() }),
            ));
        }

        Ok(())
    }

    pub fn generate(&self) -> String {
        generate_slug(self.default_length)
    }
}

/// Service for creating, editing, listing and resolving short links.
///
/// Resolved links are cached by slug; edits and deletes invalidate the cache.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    policy: SlugPolicy,
}

impl LinkService {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        policy: SlugPolicy,
    ) -> Self {
        Self {
            repository,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> &SlugPolicy {
        &self.policy
    }

    /// Creates a link, generating the slug and id when absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the slug is rejected by the policy.
    /// Returns [`AppError::Conflict`] if the slug already exists.
    pub async fn create(&self, new_link: NewLink, now: i64) -> Result<Link, AppError> {
        let slug = match new_link.slug.as_deref() {
            Some(slug) => {
                let slug = self.policy.normalize(slug);
                self.policy.validate(&slug)?;

                if self.repository.find_by_slug(&slug).await?.is_some() {
                    return Err(AppError::conflict(
                        "Link already exists",
                        json!({ "slug": slug }),
                    ));
                }
                slug
            }
            None => self.generate_unique_slug().await?,
        };

        let link = Link {
            id: new_link.id.unwrap_or_else(generate_id),
            slug,
            url: new_link.url,
            created_at: new_link.created_at.unwrap_or(now),
            updated_at: new_link.updated_at.unwrap_or(now),
            expiration: new_link.expiration,
            title: new_link.title,
            description: new_link.description,
            image: new_link.image,
            comment: new_link.comment,
        };

        let created = self.repository.create(link).await?;
        tracing::info!(slug = %created.slug, id = %created.id, "Link created");
        Ok(created)
    }

    /// Replaces the editable fields of an existing link.
    ///
    /// The id and creation time are kept; `updated_at` is set to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if no slug is given.
    /// Returns [`AppError::NotFound`] if the slug is unknown.
    pub async fn update(&self, edit: NewLink, now: i64) -> Result<Link, AppError> {
        let slug = edit
            .slug
            .as_deref()
            .map(|s| self.policy.normalize(s))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::bad_request("Slug is required", json!({})))?;

        let existing = self.get(&slug).await?;

        let link = Link {
            id: existing.id,
            slug: existing.slug,
            url: edit.url,
            created_at: existing.created_at,
            updated_at: now,
            expiration: edit.expiration,
            title: edit.title,
            description: edit.description,
            image: edit.image,
            comment: edit.comment,
        };

        let updated = self.repository.update(link).await?;
        self.invalidate(&updated.slug).await;
        tracing::info!(slug = %updated.slug, "Link updated");
        Ok(updated)
    }

    /// Deletes a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug is unknown.
    pub async fn delete(&self, slug: &str) -> Result<(), AppError> {
        let slug = self.policy.normalize(slug);

        if !self.repository.delete(&slug).await? {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "slug": slug }),
            ));
        }

        self.invalidate(&slug).await;
        tracing::info!(slug = %slug, "Link deleted");
        Ok(())
    }

    /// Fetches a link by slug, expired or not.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug is unknown.
    pub async fn get(&self, slug: &str) -> Result<Link, AppError> {
        let slug = self.policy.normalize(slug);

        self.repository
            .find_by_slug(&slug)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "slug": slug })))
    }

    /// Lists links in slug order, starting after `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list(&self, limit: u32, cursor: Option<String>) -> Result<LinkPage, AppError> {
        let limit = limit.max(1) as usize;
        let mut links = self
            .repository
            .list(limit as i64 + 1, cursor.filter(|c| !c.is_empty()))
            .await?;

        let cursor = if links.len() > limit {
            links.truncate(limit);
            links.last().map(|link| link.slug.clone())
        } else {
            None
        };

        Ok(LinkPage { links, cursor })
    }

    /// Resolves a slug for redirection.
    ///
    /// Returns `None` for unknown and expired links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn resolve(&self, slug: &str, now: i64) -> Result<Option<Link>, AppError> {
        let slug = self.policy.normalize(slug);

        let cached = self.cache.get_link(&slug).await.ok().flatten();
        let link = match cached {
            Some(link) => Some(link),
            None => {
                let found = self.repository.find_by_slug(&slug).await?;
                if let Some(ref link) = found
                    && !link.is_expired_at(now)
                    && let Err(e) = self.cache.set_link(link, None).await
                {
                    tracing::warn!("Failed to cache link {}: {}", slug, e);
                }
                found
            }
        };

        Ok(link.filter(|link| !link.is_expired_at(now)))
    }

    /// Returns whether the link store is reachable.
    pub async fn health_check(&self) -> bool {
        self.repository.health_check().await
    }

    async fn invalidate(&self, slug: &str) {
        if let Err(e) = self.cache.invalidate(slug).await {
            tracing::warn!("Failed to invalidate cache for {}: {}", slug, e);
        }
    }

    async fn generate_unique_slug(&self) -> Result<String, AppError> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = self.policy.generate();

            if self.policy.validate(&slug).is_err() {
                continue;
            }
            if self.repository.find_by_slug(&slug).await?.is_none() {
                return Ok(slug);
            }
        }

        Err(AppError::internal(
            "Failed to generate unique slug",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}
