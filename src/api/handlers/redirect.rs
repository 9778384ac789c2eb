//! Handler for short link redirects.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, Uri, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use std::net::SocketAddr;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its destination URL.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Request Flow
///
/// 1. Resolve the slug (cache first, then the link store)
/// 2. Extract request signals into an access-log record
/// 3. Hand the record to a detached writer task
/// 4. Respond with the configured redirect status
///
/// The access-log write never delays or fails the redirect.
///
/// # Errors
///
/// Returns 404 Not Found if the slug is unknown or the link has expired.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let now = Utc::now().timestamp();

    let Some(link) = state.link_service.resolve(&slug, now).await? else {
        debug!("No link for slug {}", slug);
        return Err(AppError::not_found(
            "Link not found",
            json!({ "slug": slug }),
        ));
    };

    let record = state
        .signals
        .extract(&headers, addr.ip(), uri.query(), Some(&link));
    state.access_log.record_detached(link.id.clone(), record);

    let location = HeaderValue::try_from(link.url.as_str()).map_err(|_| {
        AppError::internal(
            "Stored URL is not a valid Location header",
            json!({ "slug": link.slug }),
        )
    })?;

    Ok((state.redirect_status, [(header::LOCATION, location)]).into_response())
}
