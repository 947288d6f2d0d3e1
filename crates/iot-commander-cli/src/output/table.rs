//! Table-formatted output for CLI.

use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use iot_commander_core::{CommandDescription, Device, ParamValue};

use super::OutputFormatter;

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }

    fn describe_params(command: &CommandDescription) -> String {
        if command.params.is_empty() {
            return "-".to_string();
        }

        command
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableOutput {
    fn format_devices(&self, devices: &[Device]) -> String {
        if devices.is_empty() {
            return "No devices found.".to_string();
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Name", "IP"]);

        for device in devices {
            table.add_row(vec![Cell::new(&device.name), Cell::new(&device.ip)]);
        }

        format!("{}\n\nFound {} device(s)", table, devices.len())
    }

    fn format_schema(&self, device: &Device, commands: &[CommandDescription]) -> String {
        let header = format!("Device: {} ({})", device.name.bold(), device.ip);

        if commands.is_empty() {
            return format!("{}\nNo commands published.", header);
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Command", "Parameters"]);

        for command in commands {
            table.add_row(vec![
                Cell::new(&command.name).fg(Color::Cyan),
                Cell::new(Self::describe_params(command)),
            ]);
        }

        format!("{}\n{}\n\n{} command(s)", header, table, commands.len())
    }

    fn format_command_result(
        &self,
        device: &Device,
        command: &str,
        params: &[(String, ParamValue)],
        response: &str,
    ) -> String {
        let args = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ");

        let mut out = format!("{} {} ({}) '{}'", "[OK]".green(), device.name, device.ip, command);
        if !args.is_empty() {
            out.push(' ');
            out.push_str(&args);
        }
        if !response.is_empty() {
            out.push('\n');
            out.push_str(response);
        }
        out
    }
}
