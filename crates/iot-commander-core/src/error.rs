//! Error types for IoT Commander core.

use std::fmt;

use thiserror::Error;

use crate::protocol::ParameterType;

/// Core error type for shared operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("{0}")]
    Other(String),
}

/// Failures that end a discovery pass before any probe is sent
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Unable to resolve broadcast address: {0}")]
    Resolution(String),

    #[error("Unable to create UDP socket: {0}")]
    Socket(#[source] std::io::Error),
}

/// Command schema errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to fetch schema from {ip}: {message}")]
    Fetch { ip: String, message: String },

    #[error("Invalid schema from {ip}: {message}")]
    Parse { ip: String, message: String },
}

/// Command dispatch errors
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid parameters for '{command}': {}", format_issues(.issues))]
    Validation {
        command: String,
        issues: Vec<ParamIssue>,
    },

    #[error("Request to {ip} failed: {message}")]
    Network { ip: String, message: String },

    #[error("Device {ip} rejected the request with HTTP {status}: {body}")]
    Rejected { ip: String, status: u16, body: String },

    #[error("Request to {ip} was cancelled")]
    Cancelled { ip: String },
}

/// A single parameter that failed pre-dispatch validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamIssue {
    /// No value supplied for a declared parameter
    Missing { name: String },
    /// Value supplied but of the wrong type
    TypeMismatch { name: String, expected: ParameterType },
}

impl ParamIssue {
    pub fn name(&self) -> &str {
        match self {
            ParamIssue::Missing { name } | ParamIssue::TypeMismatch { name, .. } => name,
        }
    }
}

impl fmt::Display for ParamIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamIssue::Missing { name } => write!(f, "{} is missing", name),
            ParamIssue::TypeMismatch { name, expected } => {
                write!(f, "{} must be {}", name, expected.as_tag())
            }
        }
    }
}

fn format_issues(issues: &[ParamIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_every_param() {
        let err = CommandError::Validation {
            command: "setTemp".to_string(),
            issues: vec![
                ParamIssue::TypeMismatch {
                    name: "value".to_string(),
                    expected: ParameterType::Int,
                },
                ParamIssue::Missing {
                    name: "unit".to_string(),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "Invalid parameters for 'setTemp': value must be int, unit is missing"
        );
    }

    #[test]
    fn test_core_error_from_schema_error() {
        let err: CoreError = SchemaError::Parse {
            ip: "192.168.1.5".to_string(),
            message: "unknown variant".to_string(),
        }
        .into();
        assert!(format!("{}", err).contains("Invalid schema from 192.168.1.5"));
    }

    #[test]
    fn test_param_issue_name() {
        let issue = ParamIssue::Missing {
            name: "power".to_string(),
        };
        assert_eq!(issue.name(), "power");
    }
}
