//! Error types for IoT Commander CLI.
//!
//! CliError wraps CoreError from the shared library and adds CLI-specific variants.

use iot_commander_core::error::CoreError;
use thiserror::Error;

// Re-export core error types so command modules can use them via crate::error
pub use iot_commander_core::error::{CommandError, DiscoveryError, SchemaError};

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NETWORK_ERROR: i32 = 2;
    pub const DEVICE_ERROR: i32 = 3;
    pub const INVALID_ARGS: i32 = 4;
}

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No devices found")]
    NoDevicesFound,

    #[error("No device named '{0}' answered discovery")]
    DeviceNotFound(String),

    #[error("Discovery could not run: no usable IPv4 address or UDP socket (run with -v for details)")]
    DiscoveryFailed,

    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => match e {
                CoreError::Discovery(_) => exit_codes::NETWORK_ERROR,
                CoreError::Schema(SchemaError::Fetch { .. }) => exit_codes::NETWORK_ERROR,
                CoreError::Schema(SchemaError::Parse { .. }) => exit_codes::DEVICE_ERROR,
                CoreError::Command(CommandError::Validation { .. }) => exit_codes::INVALID_ARGS,
                CoreError::Command(CommandError::Rejected { .. }) => exit_codes::DEVICE_ERROR,
                CoreError::Command(_) => exit_codes::NETWORK_ERROR,
                CoreError::Other(_) => exit_codes::GENERAL_ERROR,
            },
            CliError::InvalidArgument(_) => exit_codes::INVALID_ARGS,
            CliError::NoDevicesFound => exit_codes::GENERAL_ERROR,
            CliError::DeviceNotFound(_) => exit_codes::GENERAL_ERROR,
            CliError::DiscoveryFailed => exit_codes::NETWORK_ERROR,
            CliError::Other(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<CommandError> for CliError {
    fn from(e: CommandError) -> Self {
        CliError::Core(CoreError::Command(e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        CliError::Core(CoreError::Schema(e))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
