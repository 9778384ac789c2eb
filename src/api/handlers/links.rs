//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use validator::Validate;

use crate::api::dto::link::{
    DEFAULT_LIST_LIMIT, DeleteRequest, LinkPayload, LinkResponse, ListParams, ListResponse,
    SlugQuery,
};
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a link.
///
/// # Endpoint
///
/// `POST /api/link/create`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com",
///   "slug": "my-link",          // optional, generated when absent
///   "expiration": 1767225600,   // optional, unix seconds
///   "title": "Example"          // optional
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
/// Returns 409 Conflict if the slug is taken.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<LinkPayload>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create(payload.into(), Utc::now().timestamp())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::new(link, &state.base_url)),
    ))
}

/// Replaces the editable fields of a link.
///
/// # Endpoint
///
/// `PUT /api/link/edit`
///
/// The slug in the body selects the link. `id` and `createdAt` are kept,
/// `updatedAt` is refreshed and the cached copy is invalidated.
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
/// Returns 404 Not Found if the slug is unknown.
pub async fn edit_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<LinkPayload>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update(payload.into(), Utc::now().timestamp())
        .await?;

    Ok(Json(LinkResponse::new(link, &state.base_url)))
}

/// Deletes a link.
///
/// # Endpoint
///
/// `POST /api/link/delete`
///
/// # Errors
///
/// Returns 404 Not Found if the slug is unknown.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRequest>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&payload.slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetches a link by slug, including expired links.
///
/// # Endpoint
///
/// `GET /api/link/query?slug=<slug>`
pub async fn query_link_handler(
    State(state): State<AppState>,
    Query(params): Query<SlugQuery>,
) -> Result<Json<Link>, AppError> {
    let link = state.link_service.get(&params.slug).await?;
    Ok(Json(link))
}

/// Lists links in slug order.
///
/// # Endpoint
///
/// `GET /api/link/list?limit=20&cursor=<slug>`
///
/// Pass the returned `cursor` to fetch the next page until `listComplete`
/// is true.
pub async fn list_links_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    params.validate()?;

    let page = state
        .link_service
        .list(params.limit.unwrap_or(DEFAULT_LIST_LIMIT), params.cursor)
        .await?;

    Ok(Json(page.into()))
}
