//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    counters_handler, create_link_handler, delete_link_handler, edit_link_handler,
    list_links_handler, metrics_handler, query_link_handler, verify_handler, views_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET  /verify`          - Token check
/// - `POST /link/create`     - Create a link
/// - `PUT  /link/edit`       - Replace a link's editable fields
/// - `POST /link/delete`     - Delete a link
/// - `GET  /link/query`      - Fetch one link by slug
/// - `GET  /link/list`       - Cursor-paginated link listing
/// - `GET  /stats/views`     - Visits and visitors per time bucket
/// - `GET  /stats/counters`  - Totals for the filtered range
/// - `GET  /stats/metrics`   - Top values of one dimension
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/verify", get(verify_handler))
        .route("/link/create", post(create_link_handler))
        .route("/link/edit", put(edit_link_handler))
        .route("/link/delete", post(delete_link_handler))
        .route("/link/query", get(query_link_handler))
        .route("/link/list", get(list_links_handler))
        .route("/stats/views", get(views_handler))
        .route("/stats/counters", get(counters_handler))
        .route("/stats/metrics", get(metrics_handler))
}
