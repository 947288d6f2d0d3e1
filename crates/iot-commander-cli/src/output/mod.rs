//! Output formatting for CLI results.

pub mod json;
pub mod table;

pub use json::JsonOutput;
pub use table::TableOutput;

use iot_commander_core::{CommandDescription, Device, ParamValue};

/// Output formatter trait
pub trait OutputFormatter {
    /// Format device list
    fn format_devices(&self, devices: &[Device]) -> String;

    /// Format the commands a device supports
    fn format_schema(&self, device: &Device, commands: &[CommandDescription]) -> String;

    /// Format the outcome of a dispatched command
    fn format_command_result(
        &self,
        device: &Device,
        command: &str,
        params: &[(String, ParamValue)],
        response: &str,
    ) -> String;
}

/// Get the appropriate formatter based on JSON flag
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonOutput::new())
    } else {
        Box::new(TableOutput::new())
    }
}
