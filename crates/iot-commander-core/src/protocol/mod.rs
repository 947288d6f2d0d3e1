//! Protocol layer for device control.
//!
//! This module handles parsing the command schema a device publishes and
//! building validated command requests.

pub mod commands;
pub mod schema;

pub use commands::{build_command_path, validate_params, OutgoingCommand};
pub use schema::{parse_schema, CommandDescription, ParamValue, ParameterDescription, ParameterType};
