//! JSON-formatted output for CLI.

use iot_commander_core::{CommandDescription, Device, ParamValue};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::OutputFormatter;

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_devices(&self, devices: &[Device]) -> String {
        let output = json!({
            "devices": devices,
            "count": devices.len()
        });
        Self::to_json(&output)
    }

    fn format_schema(&self, device: &Device, commands: &[CommandDescription]) -> String {
        Self::to_json(&json!({
            "device": device,
            "commands": commands,
            "count": commands.len()
        }))
    }

    fn format_command_result(
        &self,
        device: &Device,
        command: &str,
        params: &[(String, ParamValue)],
        response: &str,
    ) -> String {
        let params: Map<String, Value> = params
            .iter()
            .map(|(name, value)| (name.clone(), json!(value)))
            .collect();

        // Devices usually answer with plain text; embed JSON bodies as values
        let response_value: Value =
            serde_json::from_str(response).unwrap_or_else(|_| json!(response));

        Self::to_json(&json!({
            "device": device,
            "command": command,
            "params": params,
            "success": true,
            "response": response_value
        }))
    }
}
