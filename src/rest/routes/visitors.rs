//! Visitor page-view endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;
use crate::types::{PageViewInput, VisitorSession};

/// Record a page view for a visitor
#[utoipa::path(
    post,
    path = "/api/v1/visitors/{visitor_id}/page-views",
    tag = "Visitors",
    params(
        ("visitor_id" = String, Path, description = "Cookie-scoped visitor id")
    ),
    request_body = PageViewInput,
    responses(
        (status = 200, description = "Visitor session the view was added to", body = VisitorSession),
        (status = 400, description = "Invalid visitor id or path", body = ErrorResponse),
        (status = 409, description = "Visitor session changed concurrently", body = ErrorResponse)
    )
)]
pub async fn record_page_view(
    State(state): State<ApiState>,
    Path(visitor_id): Path<String>,
    Json(input): Json<PageViewInput>,
) -> Result<Json<VisitorSession>, ApiError> {
    let session = state.visitors.record_page_view(&visitor_id, input).await?;
    Ok(Json(session))
}
