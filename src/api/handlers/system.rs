//! System endpoints: health check and settings refresh.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    images: usize,
    profile: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, image count, active profile and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.image_service;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "UP".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            images: service.pool().len(),
            profile: service.settings().current().active_profile.clone(),
        }),
    )
}

/// `POST /refresh` — Reload runtime settings from the environment.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "System",
    summary = "Reload runtime settings",
    description = "Re-reads the diagnostic settings (log tag, active profile) and swaps them in atomically. Returns the keys that changed.",
    responses(
        (status = 200, description = "Changed setting keys", body = Vec<String>),
    )
)]
pub async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.image_service.settings().reload_from_env();
    (StatusCode::OK, Json(changed))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/refresh", post(refresh_handler))
}
