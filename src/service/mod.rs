//! Service layer: business logic orchestration.
//!
//! [`ImageService`] ties the image pool, the random selector and URL
//! construction together behind the two gateway operations.

pub mod image_service;

pub use image_service::{IMAGE_CONTENT_TYPE, ImageService};
