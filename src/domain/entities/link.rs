//! Link entity representing a slug → URL mapping.

use serde::{Deserialize, Serialize};

/// A stored short link.
///
/// Timestamps are unix seconds. `expiration`, when set, is the first second
/// at which the link stops resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub slug: String,
    pub url: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Link {
    /// Returns true if the link has expired at `now` (unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiration.is_some_and(|e| now >= e)
    }

    /// Seconds left before expiry at `now`, if the link expires.
    pub fn remaining_lifetime(&self, now: i64) -> Option<i64> {
        self.expiration.map(|e| (e - now).max(0))
    }
}

/// Validated input for creating or replacing a link.
///
/// Optional identity fields are filled in by
/// [`crate::application::services::LinkService`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLink {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub url: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub expiration: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub comment: Option<String>,
}

/// One page of links in slug order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPage {
    pub links: Vec<Link>,
    /// Slug to pass as the next cursor; `None` when the listing is complete.
    pub cursor: Option<String>,
}
