//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::analytics::{
    ConversionRollup, FormFunnel, PageConversion, RollupSummary, SourceBreakdown, StepReach,
    VisitorPivotRow,
};
use crate::rest::dto::{
    CompleteSessionRequest, CreateSessionResponse, FormSessionSummary, HealthResponse,
    StatusResponse,
};
use crate::rest::error::ErrorResponse;
use crate::store::StoreCounts;
use crate::types::{
    Attribution, FormSession, Lead, LeadInput, PageView, PageViewInput, SessionStatus, StepEvent,
    StepEventInput, VisitorSession,
};

/// OpenAPI documentation for the leadtrack REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "leadtrack API",
        description = "Valuation form session tracking, lead intake and conversion analytics.",
        license(name = "MIT")
    ),
    paths(
        // Health endpoints
        crate::rest::routes::health::health,
        crate::rest::routes::health::status,
        // Form session endpoints
        crate::rest::routes::form_sessions::create,
        crate::rest::routes::form_sessions::list,
        crate::rest::routes::form_sessions::get_one,
        crate::rest::routes::form_sessions::record_step,
        crate::rest::routes::form_sessions::complete,
        // Lead endpoints
        crate::rest::routes::leads::create,
        crate::rest::routes::leads::list,
        // Visitor endpoints
        crate::rest::routes::visitors::record_page_view,
        // Analytics endpoints
        crate::rest::routes::analytics::conversions,
        crate::rest::routes::analytics::form_funnel,
    ),
    components(
        schemas(
            // Response types
            HealthResponse,
            StatusResponse,
            StoreCounts,
            CreateSessionResponse,
            FormSessionSummary,
            FormSession,
            SessionStatus,
            StepEvent,
            Lead,
            VisitorSession,
            PageView,
            ConversionRollup,
            RollupSummary,
            VisitorPivotRow,
            PageConversion,
            FormFunnel,
            StepReach,
            SourceBreakdown,
            ErrorResponse,
            // Request types
            Attribution,
            StepEventInput,
            CompleteSessionRequest,
            LeadInput,
            PageViewInput,
        )
    ),
    tags(
        (name = "Health", description = "Health check and status endpoints"),
        (name = "Form Sessions", description = "Valuation form session tracking"),
        (name = "Leads", description = "Lead intake"),
        (name = "Visitors", description = "Page-view tracking by visitor"),
        (name = "Analytics", description = "Conversion rollup and form funnel"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate the OpenAPI specification as a YAML string
    pub fn yaml() -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let doc = ApiDoc::json().expect("Failed to generate OpenAPI document");
        assert!(doc.contains("leadtrack API"));
        assert!(doc.contains("/api/v1/health"));
        assert!(doc.contains("/api/v1/form-sessions/{session_id}/steps"));
        assert!(doc.contains("/api/v1/analytics/conversions"));
    }

    #[test]
    fn test_openapi_has_all_tags() {
        let doc = ApiDoc::json().expect("Failed to generate OpenAPI document");
        for tag in ["Health", "Form Sessions", "Leads", "Visitors", "Analytics"] {
            assert!(doc.contains(&format!("\"{}\"", tag)), "missing tag {}", tag);
        }
    }

    #[test]
    fn test_openapi_yaml() {
        let doc = ApiDoc::yaml().expect("Failed to generate OpenAPI YAML");
        assert!(doc.contains("openapi:"));
        assert!(doc.contains("/api/v1/leads"));
    }
}
