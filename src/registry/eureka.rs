//! Eureka REST client.
//!
//! Uses the plain JSON API exposed under the registry's base URL
//! (typically `http://host:8761/eureka`):
//!
//! | Call       | Request                                   |
//! |------------|-------------------------------------------|
//! | register   | `POST   {base}/apps/{APP}` + instance doc  |
//! | renew      | `PUT    {base}/apps/{APP}/{instanceId}`    |
//! | deregister | `DELETE {base}/apps/{APP}/{instanceId}`    |
//!
//! A `404` on renew means the registry already evicted the lease; the
//! client then registers again.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use super::Registration;
use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Per-call timeout for registry requests.
const REGISTRY_TIMEOUT: Duration = Duration::from_secs(5);

/// Instance document sent on registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    /// Unique id of this node, `host:service:port`.
    pub instance_id: String,
    /// Advertised host name.
    pub host_name: String,
    /// Application name, upper-cased as Eureka expects.
    pub app: String,
    /// Advertised address.
    pub ip_addr: String,
    /// Instance status, always `UP` when registering.
    pub status: String,
    /// Plain HTTP port.
    pub port: PortInfo,
    /// Secure port (disabled).
    pub secure_port: PortInfo,
    /// Virtual IP address clients resolve.
    pub vip_address: String,
    /// Secure virtual IP address.
    pub secure_vip_address: String,
    /// Root URL of this node.
    pub home_page_url: String,
    /// Status page URL.
    pub status_page_url: String,
    /// Health check URL.
    pub health_check_url: String,
    /// Data center descriptor.
    pub data_center_info: DataCenterInfo,
    /// Lease timings.
    pub lease_info: LeaseInfo,
}

/// Port number with its enabled flag.
#[derive(Debug, Clone, Serialize)]
pub struct PortInfo {
    /// Port number.
    #[serde(rename = "$")]
    pub port: u16,
    /// `"true"` or `"false"`.
    #[serde(rename = "@enabled")]
    pub enabled: String,
}

/// Data center descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct DataCenterInfo {
    /// Java class name Eureka uses to deserialize the descriptor.
    #[serde(rename = "@class")]
    pub class: String,
    /// Data center name.
    pub name: String,
}

/// Lease timings advertised to the registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseInfo {
    /// Seconds between heartbeats.
    pub renewal_interval_in_secs: u64,
    /// Seconds without heartbeat before eviction.
    pub duration_in_secs: u64,
}

#[derive(Debug, Serialize)]
struct InstanceEnvelope<'a> {
    instance: &'a InstanceInfo,
}

impl InstanceInfo {
    /// Builds the instance document for `service_id` reachable at
    /// `host:port`.
    #[must_use]
    pub fn new(service_id: &str, host: &str, port: u16, lease: LeaseInfo) -> Self {
        let base = format!("http://{host}:{port}");
        Self {
            instance_id: format!("{host}:{service_id}:{port}"),
            host_name: host.to_string(),
            app: service_id.to_uppercase(),
            ip_addr: host.to_string(),
            status: "UP".to_string(),
            port: PortInfo {
                port,
                enabled: "true".to_string(),
            },
            secure_port: PortInfo {
                port: 443,
                enabled: "false".to_string(),
            },
            vip_address: service_id.to_string(),
            secure_vip_address: service_id.to_string(),
            home_page_url: format!("{base}/"),
            status_page_url: format!("{base}/health"),
            health_check_url: format!("{base}/health"),
            data_center_info: DataCenterInfo {
                class: "com.netflix.appinfo.InstanceInfo$DefaultDataCenterInfo".to_string(),
                name: "MyOwn".to_string(),
            },
            lease_info: lease,
        }
    }

    /// Builds the instance document from the gateway configuration and the
    /// port the listener actually bound.
    #[must_use]
    pub fn from_config(config: &GatewayConfig, bound_port: u16) -> Self {
        Self::new(
            &config.service_id,
            &config.instance_host,
            bound_port,
            LeaseInfo {
                renewal_interval_in_secs: config.lease_renewal_interval().as_secs(),
                duration_in_secs: config.lease_duration_secs,
            },
        )
    }
}

/// HTTP client for a Eureka-compatible registry.
#[derive(Debug, Clone)]
pub struct EurekaClient {
    http: reqwest::Client,
    base_url: String,
    instance: InstanceInfo,
}

impl EurekaClient {
    /// Creates a client for the registry at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Registration`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>, instance: InstanceInfo) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(REGISTRY_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Registration(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            instance,
        })
    }

    /// Returns the instance document this client registers.
    #[must_use]
    pub fn instance(&self) -> &InstanceInfo {
        &self.instance
    }

    fn app_url(&self) -> String {
        format!("{}/apps/{}", self.base_url, self.instance.app)
    }

    fn instance_url(&self) -> String {
        format!("{}/{}", self.app_url(), self.instance.instance_id)
    }
}

fn request_failed(call: &str, err: &reqwest::Error) -> GatewayError {
    GatewayError::Registration(format!("{call} failed: {err}"))
}

fn unexpected_status(call: &str, status: StatusCode) -> GatewayError {
    GatewayError::Registration(format!("{call} returned {status}"))
}

#[async_trait]
impl Registration for EurekaClient {
    async fn register(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.app_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&InstanceEnvelope {
                instance: &self.instance,
            })
            .send()
            .await
            .map_err(|e| request_failed("register", &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unexpected_status("register", status));
        }
        tracing::info!(
            instance_id = %self.instance.instance_id,
            registry = %self.base_url,
            "registered with discovery registry"
        );
        Ok(())
    }

    async fn renew(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .put(self.instance_url())
            .send()
            .await
            .map_err(|e| request_failed("renew", &e))?;

        match response.status() {
            status if status.is_success() => {
                tracing::trace!(instance_id = %self.instance.instance_id, "lease renewed");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                tracing::warn!(
                    instance_id = %self.instance.instance_id,
                    "lease unknown to registry, registering again"
                );
                self.register().await
            }
            status => Err(unexpected_status("renew", status)),
        }
    }

    async fn deregister(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(self.instance_url())
            .send()
            .await
            .map_err(|e| request_failed("deregister", &e))?;

        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => {
                tracing::info!(instance_id = %self.instance.instance_id, "deregistered");
                Ok(())
            }
            status => Err(unexpected_status("deregister", status)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn instance() -> InstanceInfo {
        InstanceInfo::new(
            "images-ms",
            "node-1",
            8080,
            LeaseInfo {
                renewal_interval_in_secs: 30,
                duration_in_secs: 90,
            },
        )
    }

    #[test]
    fn instance_document_uses_eureka_field_names() {
        let json = serde_json::to_value(InstanceEnvelope {
            instance: &instance(),
        })
        .unwrap_or_default();
        let doc = &json["instance"];
        assert_eq!(doc["instanceId"], "node-1:images-ms:8080");
        assert_eq!(doc["app"], "IMAGES-MS");
        assert_eq!(doc["port"]["$"], 8080);
        assert_eq!(doc["port"]["@enabled"], "true");
        assert_eq!(doc["leaseInfo"]["renewalIntervalInSecs"], 30);
        assert_eq!(doc["healthCheckUrl"], "http://node-1:8080/health");
    }

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let Ok(client) = EurekaClient::new("http://registry:8761/eureka/", instance()) else {
            panic!("client builds");
        };
        assert_eq!(client.app_url(), "http://registry:8761/eureka/apps/IMAGES-MS");
        assert_eq!(
            client.instance_url(),
            "http://registry:8761/eureka/apps/IMAGES-MS/node-1:images-ms:8080"
        );
    }
}
