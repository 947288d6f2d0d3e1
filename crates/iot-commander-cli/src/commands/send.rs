//! Sends one command to a device.
//!
//! The device schema is fetched first so `name=value` arguments can be
//! coerced to the declared parameter types before dispatch.

use std::collections::HashMap;

use iot_commander_core::{
    CommandDescription, CommandDispatcher, CommandSchemaClient, ControlConfig, DeviceHttpClient,
    ParamValue,
};

use super::interruptible;
use crate::cli::SendArgs;
use crate::device::discovery::resolve_target;
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the send command
pub async fn run_send(args: SendArgs, control: ControlConfig, json: bool) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let raw = parse_assignments(&args.params)?;
    let device = resolve_target(&args.target, &args.discovery).await?;

    let http = DeviceHttpClient::new(&control)?;
    let schema = CommandSchemaClient::new(http.clone());
    let dispatcher = CommandDispatcher::new(http.clone());

    let (command, values, response) = interruptible(&http, async {
        let commands = schema.fetch_schema(&device).await?;
        let command = find_command(&commands, &args.command)?.clone();
        let values = coerce_params(&command, &raw)?;
        let response = dispatcher.send(&device, &command, &values).await?;
        Ok::<_, CliError>((command, values, response))
    })
    .await?;

    let sent: Vec<(String, ParamValue)> = command
        .params
        .iter()
        .filter_map(|p| values.get(&p.name).map(|v| (p.name.clone(), v.clone())))
        .collect();

    println!(
        "{}",
        formatter.format_command_result(&device, &command.name, &sent, &response)
    );

    Ok(())
}

/// Split `name=value` arguments. Values may themselves contain `=`.
fn parse_assignments(params: &[String]) -> Result<Vec<(String, String)>, CliError> {
    let mut parsed: Vec<(String, String)> = Vec::with_capacity(params.len());

    for param in params {
        let (name, value) = param.split_once('=').ok_or_else(|| {
            CliError::InvalidArgument(format!("expected NAME=VALUE, got '{}'", param))
        })?;

        if name.is_empty() {
            return Err(CliError::InvalidArgument(format!(
                "missing parameter name in '{}'",
                param
            )));
        }
        if parsed.iter().any(|(n, _)| n == name) {
            return Err(CliError::InvalidArgument(format!(
                "parameter '{}' given more than once",
                name
            )));
        }

        parsed.push((name.to_string(), value.to_string()));
    }

    Ok(parsed)
}

fn find_command<'a>(
    commands: &'a [CommandDescription],
    name: &str,
) -> Result<&'a CommandDescription, CliError> {
    commands.iter().find(|c| c.name == name).ok_or_else(|| {
        let available: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        CliError::InvalidArgument(format!(
            "device has no command '{}' (available: {})",
            name,
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        ))
    })
}

/// Coerce raw values to the declared types. Unknown names are rejected.
fn coerce_params(
    command: &CommandDescription,
    raw: &[(String, String)],
) -> Result<HashMap<String, ParamValue>, CliError> {
    raw.iter()
        .map(|(name, value)| {
            let param = command.param(name).ok_or_else(|| {
                CliError::InvalidArgument(format!(
                    "command '{}' has no parameter '{}'",
                    command.name, name
                ))
            })?;
            Ok((name.clone(), ParamValue::parse_as(param.ty, value)))
        })
        .collect()
}
