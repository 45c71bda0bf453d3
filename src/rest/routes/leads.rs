//! Lead intake endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::rest::dto::WindowQuery;
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;
use crate::types::{Lead, LeadInput};

/// Submit a lead; a named form session is completed and linked to it
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    tag = "Leads",
    request_body = LeadInput,
    responses(
        (status = 201, description = "Lead created", body = Lead),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ApiState>,
    Json(input): Json<LeadInput>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = state.leads.create_lead(input).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// List leads created within the window, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leads",
    tag = "Leads",
    params(WindowQuery),
    responses(
        (status = 200, description = "Leads, newest first", body = Vec<Lead>),
        (status = 400, description = "Invalid window", body = ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let days = state.window_days(query.validated()?);
    Ok(Json(state.leads.list_leads(days).await?))
}
