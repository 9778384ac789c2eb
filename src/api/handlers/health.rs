//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Link store round trip
/// 2. **Cache**: Redis PING (always ok when caching is disabled)
/// 3. **Analytics**: Analytics engine ping
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Link store reachable" },
///     "cache": { "status": "ok", "message": "Cache reachable" },
///     "analytics": { "status": "ok", "message": "Analytics engine reachable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, cache, analytics) = tokio::join!(
        state.link_service.health_check(),
        state.cache.health_check(),
        state.stats_service.health_check(),
    );

    let database = check("Link store", database);
    let cache = check("Cache", cache);
    let analytics = check("Analytics engine", analytics);

    let all_healthy =
        database.status == "ok" && cache.status == "ok" && analytics.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            cache,
            analytics,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn check(component: &str, healthy: bool) -> CheckStatus {
    if healthy {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("{component} reachable")),
        }
    } else {
        CheckStatus {
            status: "error".to_string(),
            message: Some(format!("{component} unreachable")),
        }
    }
}
