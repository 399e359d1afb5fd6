//! # images-gateway
//!
//! Discoverable HTTP gateway serving randomly selected images.
//!
//! Each node holds a fixed pool of images loaded at startup. Callers either
//! ask for the URL of a random image, built from the scheme, host and port
//! their own request arrived on, or fetch an image by name and receive its
//! bytes as a chunked stream. Nodes announce themselves to a Eureka-style
//! discovery registry so callers never need a fixed address.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ImageService (service/)
//!     │
//!     ├── ImagePool, RandomSelector, URL builder (domain/)
//!     │
//!     └── LeaseKeeper → Eureka registry (registry/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod registry;
pub mod service;
