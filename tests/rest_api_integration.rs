//! End-to-end tests for the REST API over the JSON file store.
//!
//! Each test drives the full router (routing, extractors, error mapping) with
//! `tower::ServiceExt::oneshot` against a store rooted in a temp directory, so
//! no port is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use leadtrack::config::Config;
use leadtrack::rest::{build_router, ApiState};
use leadtrack::store::{JsonFileStore, RecordStore};

// ─── Test Context ─────────────────────────────────────────────────────────────

struct TestContext {
    temp_dir: TempDir,
    config: Config,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.paths.data = temp_dir.path().to_string_lossy().to_string();
        Self { temp_dir, config }
    }

    async fn store(&self) -> Arc<dyn RecordStore> {
        Arc::new(
            JsonFileStore::open(self.temp_dir.path())
                .await
                .expect("Failed to open file store"),
        )
    }

    async fn router(&self) -> Router {
        build_router(ApiState::new(self.config.clone(), self.store().await))
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

// ─── Form Sessions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_form_session_lifecycle() {
    let ctx = TestContext::new();
    let router = ctx.router().await;

    let (status, created) = send(
        &router,
        "POST",
        "/api/v1/form-sessions",
        Some(json!({"utmSource": "google", "utmCampaign": "spring", "deviceType": "mobile"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let steps_uri = format!("/api/v1/form-sessions/{}/steps", session_id);
    let (status, _) = send(
        &router,
        "POST",
        &steps_uri,
        Some(json!({"step": 4, "stepName": "property_type", "duration": 5.0, "answer": "flat"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, session) = send(
        &router,
        "POST",
        &steps_uri,
        Some(json!({"step": 5, "stepName": "bedrooms", "duration": 3.0, "wasSkipped": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["stepsCompleted"], 1);
    assert_eq!(session["maxStepReached"], 5);
    assert_eq!(session["totalDuration"], 8.0);
    assert_eq!(session["stepHistory"].as_array().unwrap().len(), 2);
    assert_eq!(session["utmSource"], "google");

    let (status, session) = send(
        &router,
        "POST",
        &format!("/api/v1/form-sessions/{}/complete", session_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["completed"], true);
    assert_eq!(session["convertedToLead"], false);

    let (status, listed) = send(&router, "GET", "/api/v1/form-sessions?days=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["status"], "completed");
}

#[tokio::test]
async fn test_sessions_survive_store_reopen() {
    let ctx = TestContext::new();

    let session_id = {
        let router = ctx.router().await;
        let (_, created) = send(&router, "POST", "/api/v1/form-sessions", Some(json!({}))).await;
        let session_id = created["sessionId"].as_str().unwrap().to_string();
        send(
            &router,
            "POST",
            &format!("/api/v1/form-sessions/{}/steps", session_id),
            Some(json!({"step": 4, "stepName": "address", "duration": 12.5})),
        )
        .await;
        session_id
    };

    let router = ctx.router().await;
    let (status, session) = send(
        &router,
        "GET",
        &format!("/api/v1/form-sessions/{}", session_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["totalDuration"], 12.5);
    assert_eq!(session["currentStep"], 4);
}

#[tokio::test]
async fn test_error_statuses() {
    let ctx = TestContext::new();
    let router = ctx.router().await;

    let (status, body) = send(
        &router,
        "POST",
        "/api/v1/form-sessions/nonexistent/complete",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (_, created) = send(&router, "POST", "/api/v1/form-sessions", Some(json!({}))).await;
    let session_id = created["sessionId"].as_str().unwrap();
    let (status, body) = send(
        &router,
        "POST",
        &format!("/api/v1/form-sessions/{}/steps", session_id),
        Some(json!({"step": 4, "stepName": "", "duration": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send(&router, "GET", "/api/v1/analytics/conversions?days=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Leads and Analytics ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_lead_links_session_and_shows_in_funnel() {
    let ctx = TestContext::new();
    let router = ctx.router().await;

    let (_, created) = send(
        &router,
        "POST",
        "/api/v1/form-sessions",
        Some(json!({"utmSource": "facebook"})),
    )
    .await;
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let (status, lead) = send(
        &router,
        "POST",
        "/api/v1/leads",
        Some(json!({
            "name": "Priya Natarajan",
            "email": "priya@example.com",
            "address": "4 Mill Street",
            "formSessionId": session_id,
            "utmSource": "facebook"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let lead_id = lead["id"].as_str().unwrap().to_string();

    let (_, session) = send(
        &router,
        "GET",
        &format!("/api/v1/form-sessions/{}", session_id),
        None,
    )
    .await;
    assert_eq!(session["convertedToLead"], true);
    assert_eq!(session["leadId"], lead_id.as_str());

    let (status, funnel) = send(&router, "GET", "/api/v1/analytics/form-funnel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(funnel["totalSessions"], 1);
    assert_eq!(funnel["convertedSessions"], 1);
    assert_eq!(funnel["completionRate"], "100.0");
    assert_eq!(funnel["bySource"][0]["source"], "facebook");

    let (_, leads) = send(&router, "GET", "/api/v1/leads", None).await;
    assert_eq!(leads.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_conversion_rollup_over_ten_visitors() {
    let ctx = TestContext::new();
    let router = ctx.router().await;

    for i in 0..10 {
        let (status, _) = send(
            &router,
            "POST",
            &format!("/api/v1/visitors/visitor-{}/page-views", i),
            Some(json!({"path": "/", "utmSource": "google"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    for i in 0..3 {
        send(
            &router,
            "POST",
            &format!("/api/v1/visitors/visitor-{}/page-views", i),
            Some(json!({"path": "/valuation"})),
        )
        .await;
        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/leads",
            Some(json!({
                "name": format!("Visitor {}", i),
                "phone": "0161 496 0000",
                "visitorId": format!("visitor-{}", i)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, rollup) = send(&router, "GET", "/api/v1/analytics/conversions?days=30", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rollup["summary"]["totalSessions"], 10);
    assert_eq!(rollup["summary"]["convertedSessions"], 3);
    assert_eq!(rollup["summary"]["overallConversionRate"], "30.0");
    assert_eq!(rollup["pivotData"].as_array().unwrap().len(), 10);

    let pages = rollup["pageConversionRates"].as_array().unwrap();
    let valuation = pages.iter().find(|p| p["page"] == "/valuation").unwrap();
    assert_eq!(valuation["conversionRate"], "100.0");
    let home = pages.iter().find(|p| p["page"] == "/").unwrap();
    assert_eq!(home["conversionRate"], "30.0");

    let (_, status_body) = send(&router, "GET", "/api/v1/status", None).await;
    assert_eq!(status_body["records"]["leads"], 3);
    assert_eq!(status_body["records"]["visitorSessions"], 10);
}
