//! UDP discovery for the CLI.
//!
//! Thin wrapper around core's discovery engine: one-shot passes and
//! resolving a command target given as IP or device name.

use std::net::Ipv4Addr;

use iot_commander_core::discovery::{DiscoveryEngine, DiscoverySnapshot, DiscoveryState};
use iot_commander_core::Device;
use tracing::info;

use crate::cli::DiscoveryArgs;
use crate::error::CliError;

pub fn build_engine(args: &DiscoveryArgs) -> DiscoveryEngine {
    DiscoveryEngine::new(args.config(), args.resolver())
}

/// Run one discovery pass and return the devices found.
pub async fn discover_devices(args: &DiscoveryArgs) -> Result<Vec<Device>, CliError> {
    let snapshot = DiscoveryEngine::discover_once(args.config(), args.resolver()).await;
    devices_from(snapshot)
}

pub fn devices_from(snapshot: DiscoverySnapshot) -> Result<Vec<Device>, CliError> {
    match snapshot.state {
        DiscoveryState::Error => Err(CliError::DiscoveryFailed),
        _ => Ok(snapshot.devices),
    }
}

/// Turn a target argument into a device.
///
/// An IPv4 address is used directly. Anything else is treated as a device
/// name and looked up with a discovery pass.
pub async fn resolve_target(target: &str, args: &DiscoveryArgs) -> Result<Device, CliError> {
    if target.parse::<Ipv4Addr>().is_ok() {
        return Ok(Device::new(target, target));
    }

    info!(name = %target, "Looking up device by name");
    let devices = discover_devices(args).await?;
    select_by_name(target, devices)
}

fn select_by_name(name: &str, devices: Vec<Device>) -> Result<Device, CliError> {
    let mut matches: Vec<Device> = devices.into_iter().filter(|d| d.name == name).collect();

    match matches.len() {
        0 => Err(CliError::DeviceNotFound(name.to_string())),
        1 => Ok(matches.remove(0)),
        _ => {
            let ips: Vec<&str> = matches.iter().map(|d| d.ip.as_str()).collect();
            Err(CliError::InvalidArgument(format!(
                "'{}' matches several devices ({}); use an IP address",
                name,
                ips.join(", ")
            )))
        }
    }
}
