//! Image handlers: random image URL and image streaming.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ImageUrlResponse, RandomImageQuery};
use crate::app_state::AppState;
use crate::domain::RequestContext;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::IMAGE_CONTENT_TYPE;

/// `GET /images?random=true&fields=url` — URL of a random image.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the query discriminators
/// are missing or different.
#[utoipa::path(
    get,
    path = "/images",
    tag = "Images",
    summary = "Random image URL",
    description = "Picks an image at random and returns an absolute URL to it, built from the scheme, host and port this request arrived on.",
    params(RandomImageQuery),
    responses(
        (status = 200, description = "URL of a random image", body = ImageUrlResponse),
        (status = 400, description = "Unsupported query", body = ErrorResponse),
    )
)]
pub async fn random_image_url(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<RandomImageQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    if !query.is_random_url() {
        return Err(GatewayError::InvalidRequest(
            "expected random=true&fields=url".to_string(),
        ));
    }

    let image_url = state.image_service.random_image_url(&ctx)?;
    Ok(Json(ImageUrlResponse { image_url }))
}

/// `GET /images/{*name}` — Stream an image.
///
/// `name` is the rest of the path, so nested names such as
/// `cats/tabby.jpg` resolve as one image.
///
/// # Errors
///
/// Returns [`GatewayError::ImageNotFound`] if the image is not in the pool.
#[utoipa::path(
    get,
    path = "/images/{name}",
    tag = "Images",
    summary = "Stream an image",
    description = "Streams the raw bytes of the named image. The name may contain slashes.",
    params(
        ("name" = String, Path, description = "Image name, may span several path segments"),
    ),
    responses(
        (status = 200, description = "Image bytes", body = Vec<u8>, content_type = "image/jpg"),
        (status = 404, description = "Image not found", body = ErrorResponse),
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, GatewayError> {
    let image = state.image_service.stream(&name).await?;
    tracing::debug!(image = %name, len = image.len, "streaming image");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(IMAGE_CONTENT_TYPE)),
            (header::CONTENT_LENGTH, HeaderValue::from(image.len)),
        ],
        Body::from_stream(image.stream),
    )
        .into_response())
}

/// Image routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images", get(random_image_url))
        .route("/images/{*name}", get(get_image))
}
