//! IoT Commander core library.
//!
//! Shared by the CLI and any other front end. Provides UDP broadcast
//! discovery of devices on the local subnet, parsing of the command schema a
//! device publishes over HTTP, and validated command dispatch.

pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod types;

pub use config::{ControlConfig, DiscoveryConfig};
pub use device::{CommandDispatcher, CommandSchemaClient, DeviceHttpClient};
pub use discovery::{DiscoveryEngine, DiscoverySnapshot, DiscoveryState};
pub use error::{CoreError, Result};
pub use protocol::{CommandDescription, OutgoingCommand, ParamValue, ParameterDescription, ParameterType};
pub use types::Device;
