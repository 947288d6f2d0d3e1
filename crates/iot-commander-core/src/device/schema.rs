//! Command schema client.

use tracing::{debug, warn};

use super::http::DeviceHttpClient;
use crate::error::{CoreError, SchemaError};
use crate::protocol::commands::COMMANDS_ENDPOINT;
use crate::protocol::schema::{parse_schema, CommandDescription};
use crate::types::Device;

/// Fetches the command schema a device publishes.
///
/// Stateless: a fetch yields the complete schema or an error, so a caller
/// keeping the previous schema never sees it partially replaced.
#[derive(Clone)]
pub struct CommandSchemaClient {
    http: DeviceHttpClient,
}

impl CommandSchemaClient {
    pub fn new(http: DeviceHttpClient) -> Self {
        Self { http }
    }

    pub async fn fetch_schema(&self, device: &Device) -> Result<Vec<CommandDescription>, CoreError> {
        let response = self
            .http
            .get(device, COMMANDS_ENDPOINT)
            .await
            .map_err(|e| SchemaError::Fetch {
                ip: device.ip.clone(),
                message: e.to_string(),
            })?;

        if !response.is_success() {
            warn!(ip = %device.ip, status = response.status, "Schema request rejected");
            return Err(SchemaError::Fetch {
                ip: device.ip.clone(),
                message: format!("HTTP {}: {}", response.status, response.body),
            }
            .into());
        }

        let commands = parse_schema(&response.body).map_err(|e| SchemaError::Parse {
            ip: device.ip.clone(),
            message: e.to_string(),
        })?;

        debug!(ip = %device.ip, count = commands.len(), "Fetched command schema");
        Ok(commands)
    }
}
