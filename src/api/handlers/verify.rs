//! Token verification endpoint.

use axum::{Json, extract::State};

use crate::api::dto::link::VerifyResponse;
use crate::state::AppState;

/// Confirms that the bearer token is accepted.
///
/// # Endpoint
///
/// `GET /api/verify`
pub async fn verify_handler(State(state): State<AppState>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        name: "Sink".to_string(),
        url: state.base_url.clone(),
    })
}
