//! Data Transfer Objects for the REST API.
//!
//! Request bodies for steps, leads and page views reuse the record input types
//! from [`crate::types`]; the types here cover what those don't.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::rest::error::ApiError;
use crate::store::StoreCounts;
use crate::tracking::validate_window_days;
use crate::types::{FormSession, SessionStatus};

// =============================================================================
// Form session DTOs
// =============================================================================

/// Response for session creation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Request to complete a session
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionRequest {
    #[serde(default)]
    pub lead_id: Option<String>,
}

/// Summary row for listing sessions (no step history or answers)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub current_step: u32,
    pub max_step_reached: u32,
    pub steps_completed: u32,
    pub total_duration: f64,
    pub average_step_time: f64,
    pub converted_to_lead: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_step: Option<u32>,
    pub source: String,
}

impl From<&FormSession> for FormSessionSummary {
    fn from(s: &FormSession) -> Self {
        Self {
            session_id: s.session_id.clone(),
            created_at: s.created_at,
            updated_at: s.updated_at,
            status: s.status(),
            current_step: s.current_step,
            max_step_reached: s.max_step_reached,
            steps_completed: s.steps_completed,
            total_duration: s.total_duration,
            average_step_time: s.average_step_time,
            converted_to_lead: s.converted_to_lead,
            lead_id: s.lead_id.clone(),
            exit_step: s.exit_step,
            source: s.attribution.source_label().to_string(),
        }
    }
}

// =============================================================================
// Query DTOs
// =============================================================================

/// Trailing time window for listings and analytics
#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WindowQuery {
    /// Days to look back (default from `tracking.default_window_days`)
    #[serde(default)]
    pub days: Option<u32>,
}

impl WindowQuery {
    /// The requested window, rejecting empty or absurd ranges
    pub fn validated(&self) -> Result<Option<u32>, ApiError> {
        Ok(validate_window_days(self.days)?)
    }
}

// =============================================================================
// Health/Status DTOs
// =============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Status response with store info
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub store_backend: String,
    pub records: StoreCounts,
}
