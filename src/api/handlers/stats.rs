//! Handlers for access-log statistics.

use axum::{
    Json,
    extract::{Query, State},
};
use validator::Validate;

use crate::api::dto::stats::{StatsParams, StatsResponse};
use crate::domain::stats::{Counters, MetricRow, ViewRow};
use crate::error::AppError;
use crate::state::AppState;

/// Visits and visitors per time bucket.
///
/// # Endpoint
///
/// `GET /api/stats/views?unit=hour&clientTimezone=Europe/Berlin`
///
/// Accepts the shared filters (`id`, `startAt`, `endAt`, `slug`, `country`,
/// `os`, `browser`, `deviceType`, `source`).
///
/// # Errors
///
/// Returns 400 Bad Request for a missing or unsupported unit or a malformed
/// timezone.
pub async fn views_handler(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse<Vec<ViewRow>>>, AppError> {
    params.validate()?;

    let query = params.views_query()?;
    let data = state.stats_service.views(&query).await?;

    Ok(Json(StatsResponse { data }))
}

/// Totals of visits, visitors and referring hosts.
///
/// # Endpoint
///
/// `GET /api/stats/counters`
pub async fn counters_handler(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse<Counters>>, AppError> {
    params.validate()?;

    let data = state.stats_service.counters(&params.filter()).await?;

    Ok(Json(StatsResponse { data }))
}

/// Most frequent values of one dimension.
///
/// # Endpoint
///
/// `GET /api/stats/metrics?type=country&limit=10`
///
/// # Errors
///
/// Returns 400 Bad Request if `type` is missing or not a breakdown dimension.
pub async fn metrics_handler(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse<Vec<MetricRow>>>, AppError> {
    params.validate()?;

    let dimension = params.metric_dimension()?;
    let data = state
        .stats_service
        .metrics(dimension, &params.filter(), params.metrics_limit())
        .await?;

    Ok(Json(StatsResponse { data }))
}
