//! Background task keeping this node's registry lease alive.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::Registration;

/// Owns the register → renew → deregister lifecycle.
///
/// The initial registration and every renewal are best-effort: failures
/// are logged and the task keeps going. If renewals keep failing the
/// registry evicts the node on its own; nothing here tries to detect that.
#[derive(Debug)]
pub struct LeaseKeeper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LeaseKeeper {
    /// Spawns the lease task on the current runtime.
    #[must_use]
    pub fn spawn(registration: Arc<dyn Registration>, interval: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(registration, interval, shutdown_rx));
        Self { shutdown, task }
    }

    /// Stops renewing, deregisters, and waits for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "lease task ended abnormally");
        }
    }

    /// Waits for `signal`, then shuts the lease down.
    ///
    /// Meant as the graceful-shutdown future of the HTTP server: the node
    /// leaves the registry as soon as the signal fires, before in-flight
    /// requests are drained, so callers stop being routed to it.
    pub async fn shutdown_on<F>(self, signal: F)
    where
        F: Future<Output = ()> + Send,
    {
        signal.await;
        self.shutdown().await;
    }
}

async fn run(
    registration: Arc<dyn Registration>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = registration.register().await {
        tracing::warn!(error = %e, "registration failed, serving without discovery");
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => match registration.renew().await {
                Ok(()) => {
                    if consecutive_failures > 0 {
                        tracing::info!(consecutive_failures, "lease renewal recovered");
                    }
                    consecutive_failures = 0;
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    tracing::warn!(error = %e, consecutive_failures, "lease renewal failed");
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    if let Err(e) = registration.deregister().await {
        tracing::warn!(error = %e, "deregistration failed");
    }
}
