//! Command dispatcher.

use std::collections::HashMap;

use tracing::{debug, info};

use super::http::{DeviceHttpClient, HttpFailure};
use crate::error::{CommandError, CoreError};
use crate::protocol::commands::{build_command_path, validate_params, OutgoingCommand};
use crate::protocol::schema::{CommandDescription, ParamValue};
use crate::types::Device;

/// Validates parameter values and sends commands to a device.
///
/// Never retries; a failed request is reported to the caller as is.
#[derive(Clone)]
pub struct CommandDispatcher {
    http: DeviceHttpClient,
}

impl CommandDispatcher {
    pub fn new(http: DeviceHttpClient) -> Self {
        Self { http }
    }

    /// Send `command` with `param_values` and return the raw response body.
    ///
    /// Validation runs first; on a validation error no request is made.
    pub async fn send(
        &self,
        device: &Device,
        command: &CommandDescription,
        param_values: &HashMap<String, ParamValue>,
    ) -> Result<String, CoreError> {
        validate_params(command, param_values)?;

        let path = build_command_path(command, param_values);
        info!(ip = %device.ip, command = %command.name, "Sending command");

        let response = self.http.get(device, &path).await.map_err(|e| match e {
            HttpFailure::Cancelled => CommandError::Cancelled {
                ip: device.ip.clone(),
            },
            HttpFailure::Transport(message) => CommandError::Network {
                ip: device.ip.clone(),
                message,
            },
        })?;

        if !response.is_success() {
            return Err(CommandError::Rejected {
                ip: device.ip.clone(),
                status: response.status,
                body: response.body,
            }
            .into());
        }

        debug!(ip = %device.ip, response = %response.body, "Command response");
        Ok(response.body)
    }

    pub async fn dispatch(
        &self,
        device: &Device,
        outgoing: &OutgoingCommand,
    ) -> Result<String, CoreError> {
        self.send(device, &outgoing.command, &outgoing.param_values)
            .await
    }
}
