//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Startup settings live in
//! [`GatewayConfig`] and are read once. The diagnostic settings in
//! [`RuntimeSettings`] can be reloaded while the server runs; readers
//! always see a whole snapshot through [`SettingsHandle`].

use std::collections::HashMap;
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Directory holding the bundled images.
    pub images_dir: PathBuf,

    /// Logical service name registered with the discovery registry.
    pub service_id: String,

    /// Base URL of the Eureka registry. `None` disables registration.
    pub registry_url: Option<String>,

    /// Host name advertised to the registry.
    pub instance_host: String,

    /// Seconds between lease renewals.
    pub lease_renewal_interval_secs: u64,

    /// Lease duration advertised to the registry, in seconds.
    pub lease_duration_secs: u64,

    /// Handler timeout in seconds.
    pub request_timeout_secs: u64,

    /// Emit JSON log lines instead of human-readable text.
    pub log_json: bool,

    /// Initial diagnostic settings.
    pub runtime: RuntimeSettings,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;

        let images_dir = std::env::var("IMAGES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("images"));

        let service_id = std::env::var("SERVICE_ID").unwrap_or_else(|_| "images-ms".to_string());

        let registry_url = std::env::var("REGISTRY_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let instance_host = std::env::var("INSTANCE_HOST").unwrap_or_else(|_| {
            if listen_addr.ip().is_unspecified() {
                "localhost".to_string()
            } else {
                listen_addr.ip().to_string()
            }
        });

        let lease_renewal_interval_secs = parse_env("LEASE_RENEWAL_INTERVAL_SECS", 30);
        let lease_duration_secs = parse_env("LEASE_DURATION_SECS", 90);
        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 30);

        let log_json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            listen_addr,
            images_dir,
            service_id,
            registry_url,
            instance_host,
            lease_renewal_interval_secs,
            lease_duration_secs,
            request_timeout_secs,
            log_json,
            runtime: RuntimeSettings::from_env(),
        })
    }

    /// Lease renewal period as a [`Duration`]. Never zero.
    #[must_use]
    pub fn lease_renewal_interval(&self) -> Duration {
        Duration::from_secs(self.lease_renewal_interval_secs.max(1))
    }

    /// Handler timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Settings that may change while the process runs.
///
/// Only used to decorate diagnostic log lines; no request behavior
/// depends on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Free-form tag prefixed to diagnostic log lines.
    pub log_tag: String,
    /// Name of the active deployment profile.
    pub active_profile: String,
}

impl RuntimeSettings {
    /// Reads the current values of `IMAGES_MS_MESSAGE` and `ACTIVE_PROFILE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the settings from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_tag: lookup("IMAGES_MS_MESSAGE").unwrap_or_else(|| "images-ms".to_string()),
            active_profile: lookup("ACTIVE_PROFILE").unwrap_or_else(|| "default".to_string()),
        }
    }

    /// Names of the keys whose values differ between `self` and `other`.
    #[must_use]
    pub fn changed_keys(&self, other: &Self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.log_tag != other.log_tag {
            keys.push("images-ms-message");
        }
        if self.active_profile != other.active_profile {
            keys.push("active-profile");
        }
        keys
    }
}

/// Shared, atomically replaceable [`RuntimeSettings`] snapshot.
///
/// Readers take a cheap `Arc` of the current snapshot; a reload builds a
/// fresh snapshot and swaps the pointer. Fields are never mutated in place.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    inner: Arc<ArcSwap<RuntimeSettings>>,
}

impl SettingsHandle {
    /// Wraps an initial snapshot.
    #[must_use]
    pub fn new(settings: RuntimeSettings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<RuntimeSettings> {
        self.inner.load_full()
    }

    /// Replaces the snapshot and returns the keys that changed.
    pub fn replace(&self, next: RuntimeSettings) -> Vec<&'static str> {
        let next = Arc::new(next);
        let previous = self.inner.swap(Arc::clone(&next));
        previous.changed_keys(&next)
    }

    /// Re-reads `.env` and the environment and swaps in the result.
    ///
    /// Values in the `.env` file take precedence over the inherited
    /// environment. The process environment itself is never written.
    pub fn reload_from_env(&self) -> Vec<&'static str> {
        let overrides = match dotenvy::dotenv_iter() {
            Ok(iter) => collect_entries(iter),
            Err(e) => {
                tracing::debug!(error = %e, "no .env file to reload");
                HashMap::new()
            }
        };
        self.reload_with(&overrides)
    }

    /// Like [`SettingsHandle::reload_from_env`], reading the overrides
    /// from the env file at `path`.
    pub fn reload_from_path(&self, path: &Path) -> Vec<&'static str> {
        let overrides = match dotenvy::from_path_iter(path) {
            Ok(iter) => collect_entries(iter),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "env file unreadable");
                HashMap::new()
            }
        };
        self.reload_with(&overrides)
    }

    fn reload_with(&self, overrides: &HashMap<String, String>) -> Vec<&'static str> {
        let next = RuntimeSettings::from_lookup(|key| {
            overrides
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        });
        let changed = self.replace(next);
        tracing::info!(?changed, "runtime settings reloaded");
        changed
    }
}

/// Collects the well-formed entries of an env file.
fn collect_entries<R: Read>(iter: dotenvy::Iter<R>) -> HashMap<String, String> {
    iter.filter_map(|entry| match entry {
        Ok(pair) => Some(pair),
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed env file line");
            None
        }
    })
    .collect()
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn settings(tag: &str, profile: &str) -> RuntimeSettings {
        RuntimeSettings {
            log_tag: tag.to_string(),
            active_profile: profile.to_string(),
        }
    }

    #[test]
    fn replace_reports_changed_keys() {
        let handle = SettingsHandle::new(settings("a", "dev"));
        let changed = handle.replace(settings("b", "dev"));
        assert_eq!(changed, vec!["images-ms-message"]);
        assert_eq!(handle.current().log_tag, "b");
    }

    #[test]
    fn replace_with_identical_snapshot_changes_nothing() {
        let handle = SettingsHandle::new(settings("a", "dev"));
        assert!(handle.replace(settings("a", "dev")).is_empty());
    }

    #[test]
    fn old_snapshot_survives_swap() {
        let handle = SettingsHandle::new(settings("a", "dev"));
        let before = handle.current();
        handle.replace(settings("b", "prod"));
        assert_eq!(before.active_profile, "dev");
        assert_eq!(handle.current().active_profile, "prod");
    }

    #[test]
    fn lookup_falls_back_to_defaults() {
        let loaded = RuntimeSettings::from_lookup(|_| None);
        assert_eq!(loaded, settings("images-ms", "default"));
    }

    #[test]
    fn reload_reads_env_file_without_touching_process_env() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let path = dir.path().join(".env");
        let contents = "IMAGES_MS_MESSAGE=reloaded-tag\nACTIVE_PROFILE=reloaded-profile\n";
        if let Err(e) = std::fs::write(&path, contents) {
            panic!("write failed: {e}");
        }

        let tag_before = std::env::var("IMAGES_MS_MESSAGE").ok();
        let profile_before = std::env::var("ACTIVE_PROFILE").ok();

        let handle = SettingsHandle::new(settings("a", "dev"));
        let changed = handle.reload_from_path(&path);

        assert_eq!(changed, vec!["images-ms-message", "active-profile"]);
        assert_eq!(*handle.current(), settings("reloaded-tag", "reloaded-profile"));
        assert_eq!(std::env::var("IMAGES_MS_MESSAGE").ok(), tag_before);
        assert_eq!(std::env::var("ACTIVE_PROFILE").ok(), profile_before);
    }

    #[test]
    fn reload_twice_from_same_file_changes_nothing_the_second_time() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let path = dir.path().join(".env");
        if let Err(e) = std::fs::write(&path, "IMAGES_MS_MESSAGE=steady\nACTIVE_PROFILE=steady\n") {
            panic!("write failed: {e}");
        }

        let handle = SettingsHandle::new(settings("a", "dev"));
        assert!(!handle.reload_from_path(&path).is_empty());
        assert!(handle.reload_from_path(&path).is_empty());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = GatewayConfig {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            images_dir: PathBuf::from("images"),
            service_id: "images-ms".to_string(),
            registry_url: None,
            instance_host: "localhost".to_string(),
            lease_renewal_interval_secs: 0,
            lease_duration_secs: 90,
            request_timeout_secs: 30,
            log_json: false,
            runtime: settings("a", "dev"),
        };
        assert_eq!(config.lease_renewal_interval(), Duration::from_secs(1));
    }
}
