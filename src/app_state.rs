//! Shared application state injected into all Axum handlers.

use std::net::SocketAddr;

use crate::service::ImageService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Image service for both gateway operations.
    pub image_service: ImageService,
    /// Address the listener is actually bound to. Fallback transport
    /// context when a request carries no usable `Host` header.
    pub local_addr: SocketAddr,
}
