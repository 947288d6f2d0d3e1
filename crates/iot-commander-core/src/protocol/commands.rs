//! Outgoing command validation and request path building.
//!
//! Commands are sent as `GET /command/<name>?p1=v1&p2=v2`.

use std::collections::HashMap;

use serde::Serialize;
use url::form_urlencoded::byte_serialize;

use super::schema::{CommandDescription, ParamValue};
use crate::error::{CommandError, ParamIssue};

/// Endpoint publishing the command schema
pub const COMMANDS_ENDPOINT: &str = "/commands";

/// Prefix of the endpoint executing a command
pub const COMMAND_ENDPOINT: &str = "/command";

/// A command with the values to send, built right before dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingCommand {
    pub command: CommandDescription,
    pub param_values: HashMap<String, ParamValue>,
}

impl OutgoingCommand {
    pub fn new(command: CommandDescription) -> Self {
        Self {
            command,
            param_values: HashMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.param_values.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        validate_params(&self.command, &self.param_values)
    }

    pub fn path(&self) -> String {
        build_command_path(&self.command, &self.param_values)
    }
}

/// Check every declared parameter has a value of the declared type.
///
/// All offending parameters are reported, in declaration order.
pub fn validate_params(
    command: &CommandDescription,
    values: &HashMap<String, ParamValue>,
) -> Result<(), CommandError> {
    let issues: Vec<ParamIssue> = command
        .params
        .iter()
        .filter_map(|param| match values.get(&param.name) {
            None => Some(ParamIssue::Missing {
                name: param.name.clone(),
            }),
            Some(value) if !param.ty.validate(value) => Some(ParamIssue::TypeMismatch {
                name: param.name.clone(),
                expected: param.ty,
            }),
            Some(_) => None,
        })
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Validation {
            command: command.name.clone(),
            issues,
        })
    }
}

/// Build the request path for a command.
///
/// Parameters are appended in the order the command declares them. Values
/// for names the command does not declare are ignored.
pub fn build_command_path(
    command: &CommandDescription,
    values: &HashMap<String, ParamValue>,
) -> String {
    let mut path = format!("{}/{}", COMMAND_ENDPOINT, encode_segment(&command.name));

    let query: Vec<String> = command
        .params
        .iter()
        .filter_map(|param| {
            values
                .get(&param.name)
                .map(|value| {
                    format!("{}={}", encode_query(&param.name), encode_query(&value.to_string()))
                })
        })
        .collect();

    for name in values.keys().filter(|name| command.param(name).is_none()) {
        tracing::debug!(command = %command.name, param = %name, "Ignoring undeclared parameter");
    }

    if !query.is_empty() {
        path.push('?');
        path.push_str(&query.join("&"));
    }

    path
}

/// Form encoding, for query names and values.
fn encode_query(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}

/// Percent-encoding for a single path segment.
///
/// Form encoding escapes everything but `*-._` and alphanumerics, and a `+`
/// in its output can only stand for a space. In a path `+` is literal.
fn encode_segment(s: &str) -> String {
    encode_query(s).replace('+', "%20")
}
