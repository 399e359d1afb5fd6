//! Domain layer: the image pool, random selection, and URL construction.
//!
//! Everything here is free of HTTP concerns. The pool is immutable after
//! startup, the selector is stateless apart from its thread-local random
//! source, and URL building is a pure function.

pub mod image_pool;
pub mod selector;
pub mod url_builder;

pub use image_pool::{ImagePool, ImageStream, OpenedImage};
pub use selector::RandomSelector;
pub use url_builder::{IMAGES_PATH, RequestContext, build_image_url};
