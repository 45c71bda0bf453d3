//! REST API for form tracking, lead intake and analytics.
//!
//! The site's form wizard and tracking snippet post here; the admin dashboard
//! reads the analytics endpoints.

use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::ApiState;

/// Default port for the REST API server
pub const DEFAULT_PORT: u16 = 7010;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/status", get(routes::health::status))
        // Form session endpoints
        .route(
            "/api/v1/form-sessions",
            get(routes::form_sessions::list).post(routes::form_sessions::create),
        )
        .route(
            "/api/v1/form-sessions/:session_id",
            get(routes::form_sessions::get_one),
        )
        .route(
            "/api/v1/form-sessions/:session_id/steps",
            post(routes::form_sessions::record_step),
        )
        .route(
            "/api/v1/form-sessions/:session_id/complete",
            post(routes::form_sessions::complete),
        )
        // Lead endpoints
        .route(
            "/api/v1/leads",
            get(routes::leads::list).post(routes::leads::create),
        )
        // Visitor endpoints
        .route(
            "/api/v1/visitors/:visitor_id/page-views",
            post(routes::visitors::record_page_view),
        )
        // Analytics endpoints
        .route(
            "/api/v1/analytics/conversions",
            get(routes::analytics::conversions),
        )
        .route(
            "/api/v1/analytics/form-funnel",
            get(routes::analytics::form_funnel),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server; returns after Ctrl-C once in-flight requests finish
pub async fn serve(state: ApiState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("REST API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
