//! images-gateway server entry point.
//!
//! Loads the image pool, starts the Axum HTTP server, and keeps this node
//! registered with the discovery registry until shutdown.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use images_gateway::api;
use images_gateway::app_state::AppState;
use images_gateway::config::{GatewayConfig, SettingsHandle};
use images_gateway::domain::ImagePool;
use images_gateway::registry::{
    EurekaClient, InstanceInfo, LeaseKeeper, NoopRegistration, Registration,
};
use images_gateway::service::ImageService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let settings = SettingsHandle::new(config.runtime.clone());
    tracing::info!(
        addr = %config.listen_addr,
        tag = %config.runtime.log_tag,
        profile = %config.runtime.active_profile,
        "starting images-gateway"
    );

    // Build domain layer; an unusable pool is fatal
    let pool = ImagePool::load_dir(&config.images_dir)
        .await
        .with_context(|| format!("loading images from {}", config.images_dir.display()))?;

    // Build service layer
    let image_service = ImageService::new(Arc::new(pool), settings.clone());

    // Bind before registering so the advertised port is the real one
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    let local_addr = listener.local_addr()?;

    let app = api::build_app(
        AppState {
            image_service,
            local_addr,
        },
        config.request_timeout(),
    );

    let lease = LeaseKeeper::spawn(
        registration(&config, local_addr.port()),
        config.lease_renewal_interval(),
    );

    #[cfg(unix)]
    reload_on_sighup(settings);

    // Leave the registry when the signal fires, then drain connections
    tracing::info!(addr = %local_addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(lease.shutdown_on(shutdown_signal()))
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Picks the registry client for this node.
fn registration(config: &GatewayConfig, port: u16) -> Arc<dyn Registration> {
    let Some(url) = &config.registry_url else {
        return Arc::new(NoopRegistration);
    };
    match EurekaClient::new(url.clone(), InstanceInfo::from_config(config, port)) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "registry client unavailable, serving without discovery");
            Arc::new(NoopRegistration)
        }
    }
}

/// Reloads runtime settings whenever the process receives `SIGHUP`.
#[cfg(unix)]
fn reload_on_sighup(settings: SettingsHandle) {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::hangup()) {
        Ok(mut hangups) => {
            tokio::spawn(async move {
                while hangups.recv().await.is_some() {
                    settings.reload_from_env();
                }
            });
        }
        Err(e) => tracing::warn!(error = %e, "SIGHUP reload unavailable"),
    }
}

/// Resolves on Ctrl-C or `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
