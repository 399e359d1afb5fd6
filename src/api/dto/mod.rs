//! Data Transfer Objects for REST request/response serialization.

pub mod image_dto;

pub use image_dto::*;
