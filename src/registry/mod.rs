//! Discovery registry integration.
//!
//! The node announces itself to a registry so callers can locate any live
//! instance by service name. [`Registration`] is the seam: [`EurekaClient`]
//! talks to a Eureka-compatible registry over HTTP, [`NoopRegistration`] is
//! used when no registry is configured, and [`LeaseKeeper`] drives either
//! through register → periodic renew → deregister.
//!
//! Registration is best-effort. Failures are logged and never stop the node
//! from serving direct traffic.

pub mod eureka;
pub mod lease;

use async_trait::async_trait;

use crate::error::GatewayError;

pub use eureka::{EurekaClient, InstanceInfo};
pub use lease::LeaseKeeper;

/// Lifecycle calls against a discovery registry.
#[async_trait]
pub trait Registration: Send + Sync + std::fmt::Debug {
    /// Announces this node.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Registration`] if the registry rejects the
    /// call or cannot be reached.
    async fn register(&self) -> Result<(), GatewayError>;

    /// Renews the lease obtained by [`Registration::register`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Registration`] if the lease could not be
    /// renewed.
    async fn renew(&self) -> Result<(), GatewayError>;

    /// Removes this node from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Registration`] if the registry could not be
    /// told.
    async fn deregister(&self) -> Result<(), GatewayError>;
}

/// Registration used when no registry is configured. Every call succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistration;

#[async_trait]
impl Registration for NoopRegistration {
    async fn register(&self) -> Result<(), GatewayError> {
        tracing::debug!("no discovery registry configured");
        Ok(())
    }

    async fn renew(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn deregister(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
