// Web server — Axum-based admin backend for sending broadcasts.
//
// All routes serve JSON. The broadcast and segment-preview routes sit
// behind the session middleware; /health and /api/login are public.
//
// Auth: stateless HMAC-SHA256 session cookies. No session table.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::dispatch::DeliveryProvider;
use crate::error::BroadcastError;

pub mod auth;
pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub provider: Arc<dyn DeliveryProvider>,
    pub config: Arc<Config>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(
    config: Config,
    db: Arc<dyn Database>,
    provider: Arc<dyn DeliveryProvider>,
    port: u16,
    bind: &str,
) -> Result<()> {
    let state = AppState {
        db,
        provider,
        config: Arc::new(config),
    };

    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("megaphone admin listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    // Authenticated API routes (require valid session cookie)
    let protected_api = Router::new()
        .route(
            "/api/admin/send-emails",
            post(handlers::broadcast::send_emails),
        )
        .route("/api/admin/segment", get(handlers::segment::preview_segment))
        .route("/api/logout", post(handlers::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Public routes (no auth)
    let public_api = Router::new()
        .route("/health", get(health))
        .route("/api/login", post(handlers::auth::login));

    Router::new()
        .merge(protected_api)
        .merge(public_api)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Uniform failure response for a broadcast error.
///
/// Unauthorized gets a bare 401; every other kind is a 500 carrying the
/// underlying detail next to a generic message.
pub fn broadcast_error_response(err: &BroadcastError) -> Response {
    match err {
        BroadcastError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "message": "Unauthorized" })),
        )
            .into_response(),
        other => send_failure_response(&other.to_string()),
    }
}

/// `500 {message: "Failed to send emails.", error}`.
pub fn send_failure_response(error: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(serde_json::json!({
            "message": "Failed to send emails.",
            "error": error,
        })),
    )
        .into_response()
}
