//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str =
    "id, slug, url, created_at, updated_at, expiration, title, description, image, comment";

#[derive(Debug, FromRow)]
struct LinkRow {
    id: String,
    slug: String,
    url: String,
    created_at: i64,
    updated_at: i64,
    expiration: Option<i64>,
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
    comment: Option<String>,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            slug: r.slug,
            url: r.url,
            created_at: r.created_at,
            updated_at: r.updated_at,
            expiration: r.expiration,
            title: r.title,
            description: r.description,
            image: r.image,
            comment: r.comment,
        }
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// All values are bound as statement parameters.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, link: Link) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            INSERT INTO links (id, slug, url, created_at, updated_at, expiration, title, description, image, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&link.id)
            .bind(&link.slug)
            .bind(&link.url)
            .bind(link.created_at)
            .bind(link.updated_at)
            .bind(link.expiration)
            .bind(&link.title)
            .bind(&link.description)
            .bind(&link.image)
            .bind(&link.comment)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict { .. } => AppError::conflict(
                    "Link already exists",
                    json!({ "slug": link.slug }),
                ),
                other => other,
            })?;

        Ok(row.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE slug = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn update(&self, link: Link) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET url = $2, updated_at = $3, expiration = $4,
                title = $5, description = $6, image = $7, comment = $8
            WHERE slug = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&link.slug)
            .bind(&link.url)
            .bind(link.updated_at)
            .bind(link.expiration)
            .bind(&link.title)
            .bind(&link.description)
            .bind(&link.image)
            .bind(&link.comment)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Link::from)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "slug": link.slug })))
    }

    async fn delete(&self, slug: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE slug = $1")
            .bind(slug)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: i64, cursor: Option<String>) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE ($1::text IS NULL OR slug > $1)
            ORDER BY slug ASC
            LIMIT $2
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(cursor)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
