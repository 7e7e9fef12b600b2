//! The robot REST client.
//!
//! All endpoints are HTTP GET under `http://<addr>/api/`. Timeouts bound
//! waiting for a response only — a motor command already delivered to the
//! device is fire-and-forget and cannot be cancelled from here.

use crate::photo::{self, Photo};
use async_trait::async_trait;
use roverctl_config::DeviceConfig;
use roverctl_core::error::DeviceError;
use roverctl_core::motion::MoveAction;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A raw response from the transport layer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport-level failures, enriched with endpoint context by the client.
#[derive(Debug, Clone)]
pub enum TransportError {
    Timeout,
    Failed(String),
}

/// The wire seam: issues one GET and returns status + body.
///
/// Production uses [`HttpTransport`]; tests substitute a recording stub.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// The reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Failed(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Failed(e.to_string()))?
            .to_vec();

        Ok(TransportResponse { status, body })
    }
}

/// Parsed `/api/status` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub camera: bool,
    pub wifi: Option<String>,
}

impl DeviceStatus {
    /// Human-readable rendering surfaced to the reasoning engine.
    pub fn render(&self) -> String {
        let camera = if self.camera {
            "✓ Working"
        } else {
            "✗ Not initialized"
        };
        let wifi = self.wifi.as_deref().unwrap_or("Unknown");
        format!("Camera: {camera} | WiFi IP: {wifi}")
    }
}

/// Client for one robot, bound to a fixed address at construction.
pub struct DeviceClient {
    base_url: String,
    transport: Arc<dyn DeviceTransport>,
    motor_timeout: Duration,
    status_timeout: Duration,
    photo_timeout: Duration,
    photos_dir: PathBuf,
}

impl DeviceClient {
    /// Create a client for the robot at `addr` (IP or host[:port]).
    pub fn new(addr: &str, config: &DeviceConfig) -> Self {
        Self::with_transport(addr, config, Arc::new(HttpTransport::new()))
    }

    /// Create a client over a custom transport (used by tests).
    pub fn with_transport(
        addr: &str,
        config: &DeviceConfig,
        transport: Arc<dyn DeviceTransport>,
    ) -> Self {
        Self {
            base_url: format!("http://{}/api", addr.trim_end_matches('/')),
            transport,
            motor_timeout: Duration::from_secs(config.motor_timeout_secs),
            status_timeout: Duration::from_secs(config.status_timeout_secs),
            photo_timeout: Duration::from_secs(config.photo_timeout_secs),
            photos_dir: config.photos_dir.clone(),
        }
    }

    async fn get(
        &self,
        endpoint: &str,
        query: Option<(&str, String)>,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, DeviceError> {
        let url = match &query {
            Some((key, value)) => format!("{}/{endpoint}?{key}={value}", self.base_url),
            None => format!("{}/{endpoint}", self.base_url),
        };
        debug!(%url, "GET");

        let response = self
            .transport
            .get(&url, timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => DeviceError::Timeout {
                    endpoint: endpoint.to_string(),
                },
                TransportError::Failed(message) => DeviceError::Network {
                    endpoint: endpoint.to_string(),
                    message,
                },
            })?;

        if !(200..300).contains(&response.status) {
            return Err(DeviceError::Http {
                endpoint: endpoint.to_string(),
                status: response.status,
            });
        }

        Ok(response.body)
    }

    /// Issue a directional motor command. Returns the device acknowledgement
    /// body as text. Failures here are soft — callers surface them as
    /// failure text to the reasoning engine.
    pub async fn motor(
        &self,
        action: MoveAction,
        duration_ms: u64,
    ) -> std::result::Result<String, DeviceError> {
        let endpoint = format!("motor/{}", action.endpoint());
        let body = self
            .get(
                &endpoint,
                Some(("duration", duration_ms.to_string())),
                self.motor_timeout,
            )
            .await?;
        let ack = String::from_utf8_lossy(&body).into_owned();
        info!(action = %action, duration_ms, "Motor command acknowledged");
        Ok(ack)
    }

    /// Stop all motors immediately.
    pub async fn stop(&self) -> std::result::Result<String, DeviceError> {
        let body = self.get("motor/stop", None, self.status_timeout).await?;
        info!("Motors stopped");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Check camera and WiFi status.
    pub async fn status(&self) -> std::result::Result<DeviceStatus, DeviceError> {
        let body = self.get("status", None, self.status_timeout).await?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| DeviceError::Decode {
                endpoint: "status".into(),
                message: e.to_string(),
            })?;

        Ok(DeviceStatus {
            camera: value["camera"].as_bool().unwrap_or(false),
            wifi: value["wifi"].as_str().map(String::from),
        })
    }

    /// Capture a photo, rotate it, archive it, and return the artifact.
    ///
    /// Any failure here is hard ([`DeviceError::Camera`]): there is no
    /// meaningful continuation without an image.
    pub async fn capture_photo(&self) -> std::result::Result<Photo, DeviceError> {
        let raw = self
            .get("camera/photo", None, self.photo_timeout)
            .await
            .map_err(|e| DeviceError::Camera(e.to_string()))?;
        info!(bytes = raw.len(), "Photo received from camera");
        photo::process(&raw, &self.photos_dir)
    }
}
