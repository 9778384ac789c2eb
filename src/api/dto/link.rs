//! DTOs for link management endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::{Validate, ValidationError};

use crate::domain::entities::{Link, LinkPage, NewLink};

/// Largest integer a JSON client can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Default page size for `GET /api/link/list`.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Link fields accepted by create and edit.
///
/// Strings are trimmed while deserializing; blank optional strings count as
/// absent.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 26))]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 2048))]
    pub slug: Option<String>,

    #[serde(deserialize_with = "trimmed_required")]
    #[validate(url(message = "Invalid URL format"), length(max = 2048))]
    pub url: String,

    #[validate(custom(function = "safe_integer"))]
    pub created_at: Option<i64>,

    #[validate(custom(function = "safe_integer"))]
    pub updated_at: Option<i64>,

    #[validate(custom(function = "safe_integer"))]
    pub expiration: Option<i64>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 2048))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 2048))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(url(message = "Invalid image URL"), length(max = 2048))]
    pub image: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(max = 2048))]
    pub comment: Option<String>,
}

impl From<LinkPayload> for NewLink {
    fn from(payload: LinkPayload) -> Self {
        NewLink {
            id: payload.id,
            slug: payload.slug,
            url: payload.url,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
            expiration: payload.expiration,
            title: payload.title,
            description: payload.description,
            image: payload.image,
            comment: payload.comment,
        }
    }
}

fn safe_integer(value: i64) -> Result<(), ValidationError> {
    if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("safe_integer"))
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn trimmed_required<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// A link together with its public short URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub link: Link,
    pub short_link: String,
}

impl LinkResponse {
    pub fn new(link: Link, base_url: &str) -> Self {
        let short_link = format!("{}/{}", base_url.trim_end_matches('/'), link.slug);
        Self { link, short_link }
    }
}

/// Body of `POST /api/link/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub slug: String,
}

/// Query of `GET /api/link/query`.
#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    pub slug: String,
}

/// Query of `GET /api/link/list`.
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct ListParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = 1024))]
    pub limit: Option<u32>,

    #[serde(default)]
    pub cursor: Option<String>,
}

/// One page of `GET /api/link/list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub links: Vec<Link>,
    pub cursor: Option<String>,
    pub list_complete: bool,
}

impl From<LinkPage> for ListResponse {
    fn from(page: LinkPage) -> Self {
        Self {
            list_complete: page.cursor.is_none(),
            links: page.links,
            cursor: page.cursor,
        }
    }
}

/// Response of `GET /api/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub name: String,
    pub url: String,
}
