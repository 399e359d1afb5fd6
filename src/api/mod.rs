//! REST API layer: route handlers, DTOs, extractors, and router composition.
//!
//! The route table is explicit:
//!
//! | Method | Path                               | Handler                        |
//! |--------|------------------------------------|--------------------------------|
//! | GET    | `/images?random=true&fields=url`   | [`handlers::images::random_image_url`] |
//! | GET    | `/images/{*name}`                  | [`handlers::images::get_image`] |
//! | GET    | `/health`                          | [`handlers::system::health_handler`] |
//! | POST   | `/refresh`                         | [`handlers::system::refresh_handler`] |

pub mod dto;
pub mod extract;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the gateway.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::images::random_image_url,
        handlers::images::get_image,
        handlers::system::health_handler,
        handlers::system::refresh_handler,
    ),
    components(schemas(
        dto::ImageUrlResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Images", description = "Random image lookup and streaming"),
        (name = "System", description = "Health and runtime settings"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the servable application: routes, middleware, and state.
///
/// `request_timeout` bounds how long a handler may take to produce its
/// response head; a body that is already streaming is not cut off.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
