//! Analytics endpoints for the admin dashboard.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::analytics::{ConversionRollup, FormFunnel};
use crate::rest::dto::WindowQuery;
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;

/// Visitor-session conversion rollup with per-page conversion rates
#[utoipa::path(
    get,
    path = "/api/v1/analytics/conversions",
    tag = "Analytics",
    params(WindowQuery),
    responses(
        (status = 200, description = "Conversion rollup", body = ConversionRollup),
        (status = 400, description = "Invalid window", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
pub async fn conversions(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ConversionRollup>, ApiError> {
    let days = state.window_days(query.validated()?);
    Ok(Json(state.analytics.conversion_rollup(days).await?))
}

/// Form funnel: step reach, exits and completion by source
#[utoipa::path(
    get,
    path = "/api/v1/analytics/form-funnel",
    tag = "Analytics",
    params(WindowQuery),
    responses(
        (status = 200, description = "Form funnel", body = FormFunnel),
        (status = 400, description = "Invalid window", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
pub async fn form_funnel(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<FormFunnel>, ApiError> {
    let days = state.window_days(query.validated()?);
    Ok(Json(state.analytics.form_funnel(days).await?))
}
