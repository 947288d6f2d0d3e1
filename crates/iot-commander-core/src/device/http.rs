//! HTTP transport shared by the schema client and the command dispatcher.

use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::config::ControlConfig;
use crate::error::CoreError;
use crate::types::Device;

/// Failure of a single request, before any HTTP status is known.
#[derive(Debug, Error)]
pub enum HttpFailure {
    #[error("{0}")]
    Transport(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Device HTTP client.
///
/// Clones share the connection pool and the cancel signal: `cancel_all`
/// on any clone aborts every outstanding and later request.
#[derive(Clone)]
pub struct DeviceHttpClient {
    client: Client,
    http_port: u16,
    cancel: Arc<watch::Sender<bool>>,
}

impl DeviceHttpClient {
    pub fn new(config: &ControlConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CoreError::Other(format!("HTTP client error: {}", e)))?;

        let (cancel, _) = watch::channel(false);

        Ok(Self {
            client,
            http_port: config.http_port,
            cancel: Arc::new(cancel),
        })
    }

    /// `http://<ip>:<port>` of a device
    pub fn base_url(&self, device: &Device) -> String {
        format!("http://{}:{}", device.ip, self.http_port)
    }

    /// GET `path` on the device and read the whole body as text.
    pub async fn get(&self, device: &Device, path: &str) -> Result<HttpResponse, HttpFailure> {
        let mut cancel = self.cancel.subscribe();
        if *cancel.borrow() {
            return Err(HttpFailure::Cancelled);
        }

        let url = format!("{}{}", self.base_url(device), path);
        debug!(url = %url, "GET");

        let request = async {
            let response = self.client.get(&url).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, body })
        };

        tokio::select! {
            result = request => result.map_err(|e| HttpFailure::Transport(e.to_string())),
            _ = cancel.wait_for(|stop| *stop) => Err(HttpFailure::Cancelled),
        }
    }

    /// Abort all outstanding requests. Later requests fail immediately.
    pub fn cancel_all(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}
