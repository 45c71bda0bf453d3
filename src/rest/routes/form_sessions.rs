//! Form session endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::rest::dto::{
    CompleteSessionRequest, CreateSessionResponse, FormSessionSummary, WindowQuery,
};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;
use crate::types::{Attribution, FormSession, StepEventInput};

/// Open a form session when the visitor reaches the first tracked step
#[utoipa::path(
    post,
    path = "/api/v1/form-sessions",
    tag = "Form Sessions",
    request_body = Attribution,
    responses(
        (status = 201, description = "Session created", body = CreateSessionResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ApiState>,
    Json(attribution): Json<Attribution>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let session_id = state.tracker.create_session(attribution).await?;
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session_id })))
}

/// List sessions created within the window
#[utoipa::path(
    get,
    path = "/api/v1/form-sessions",
    tag = "Form Sessions",
    params(WindowQuery),
    responses(
        (status = 200, description = "Session summaries, oldest first", body = Vec<FormSessionSummary>),
        (status = 400, description = "Invalid window", body = ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<FormSessionSummary>>, ApiError> {
    let days = state.window_days(query.validated()?);
    let sessions = state.tracker.list_sessions(days).await?;
    Ok(Json(sessions.iter().map(FormSessionSummary::from).collect()))
}

/// Get a session with its full step history
#[utoipa::path(
    get,
    path = "/api/v1/form-sessions/{session_id}",
    tag = "Form Sessions",
    params(
        ("session_id" = String, Path, description = "Form session id")
    ),
    responses(
        (status = 200, description = "Session details", body = FormSession),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<FormSession>, ApiError> {
    let session = state.tracker.get_session(&session_id).await?;
    Ok(Json(session))
}

/// Record a step transition
#[utoipa::path(
    post,
    path = "/api/v1/form-sessions/{session_id}/steps",
    tag = "Form Sessions",
    params(
        ("session_id" = String, Path, description = "Form session id")
    ),
    request_body = StepEventInput,
    responses(
        (status = 200, description = "Updated session", body = FormSession),
        (status = 400, description = "Malformed step event", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session changed concurrently", body = ErrorResponse)
    )
)]
pub async fn record_step(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(input): Json<StepEventInput>,
) -> Result<Json<FormSession>, ApiError> {
    input.validate().map_err(ApiError::ValidationError)?;
    let session = state.tracker.update_session(&session_id, input).await?;
    Ok(Json(session))
}

/// Mark a session completed, optionally linking the lead it produced
#[utoipa::path(
    post,
    path = "/api/v1/form-sessions/{session_id}/complete",
    tag = "Form Sessions",
    params(
        ("session_id" = String, Path, description = "Form session id")
    ),
    request_body = CompleteSessionRequest,
    responses(
        (status = 200, description = "Completed session", body = FormSession),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session changed concurrently", body = ErrorResponse)
    )
)]
pub async fn complete(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(request): Json<CompleteSessionRequest>,
) -> Result<Json<FormSession>, ApiError> {
    let session = state
        .tracker
        .complete_session(&session_id, request.lead_id)
        .await?;
    Ok(Json(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn make_state() -> ApiState {
        ApiState::new(Config::default(), Arc::new(InMemoryStore::new()))
    }

    async fn open_session(state: &ApiState) -> String {
        let (status, resp) = create(
            State(state.clone()),
            Json(Attribution {
                utm_source: Some("facebook".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        resp.0.session_id
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let state = make_state();
        let session_id = open_session(&state).await;

        let resp = get_one(State(state), Path(session_id.clone()))
            .await
            .unwrap();
        assert_eq!(resp.session_id, session_id);
        assert_eq!(resp.current_step, 3);
        assert_eq!(resp.attribution.utm_source.as_deref(), Some("facebook"));
    }

    #[tokio::test]
    async fn test_get_one_not_found() {
        let state = make_state();
        let result = get_one(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_step_rejects_negative_duration() {
        let state = make_state();
        let session_id = open_session(&state).await;

        let result = record_step(
            State(state),
            Path(session_id),
            Json(StepEventInput::new(4, "address", -1.0)),
        )
        .await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_record_step_and_complete() {
        let state = make_state();
        let session_id = open_session(&state).await;

        let resp = record_step(
            State(state.clone()),
            Path(session_id.clone()),
            Json(StepEventInput::new(4, "property_type", 6.5)),
        )
        .await
        .unwrap();
        assert_eq!(resp.steps_completed, 1);
        assert_eq!(resp.max_step_reached, 4);

        let resp = complete(
            State(state.clone()),
            Path(session_id),
            Json(CompleteSessionRequest {
                lead_id: Some("lead-1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(resp.completed);
        assert!(resp.converted_to_lead);

        let listed = list(State(state), Query(WindowQuery::default()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].converted_to_lead);
        assert_eq!(listed[0].source, "facebook");
    }

    #[tokio::test]
    async fn test_list_rejects_zero_window() {
        let state = make_state();
        let result = list(State(state), Query(WindowQuery { days: Some(0) })).await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }
}
