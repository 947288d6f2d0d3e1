//! Runtime configuration for discovery and device control.
//!
//! Defaults match the device protocol; front ends override individual
//! fields from flags or environment.

use std::time::Duration;

use crate::discovery::{
    DISCOVERY_PORT, RECEIVE_BUFFER_SIZE, RECEIVE_TIMEOUT, SEARCH_DURATION, SEARCH_INTERVAL,
};

/// Default HTTP port of the device control endpoint
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default timeout for a single HTTP request to a device
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Discovery pass options
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// UDP port devices listen on for probes
    pub port: u16,
    /// Total length of one discovery pass
    pub duration: Duration,
    /// Upper bound on a single receive call
    pub receive_timeout: Duration,
    /// Pause between probe iterations
    pub interval: Duration,
    /// Maximum accepted datagram size
    pub buffer_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DISCOVERY_PORT,
            duration: SEARCH_DURATION,
            receive_timeout: RECEIVE_TIMEOUT,
            interval: SEARCH_INTERVAL,
            buffer_size: RECEIVE_BUFFER_SIZE,
        }
    }
}

/// HTTP control options
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Port of the device HTTP server
    pub http_port: u16,
    /// Timeout applied to each request
    pub request_timeout: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
