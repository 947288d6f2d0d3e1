//! Shared type definitions.

use serde::{Deserialize, Serialize};

/// A device that answered a discovery probe.
///
/// Two devices are the same device when both name and IP match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Name the device reported in its discovery response
    pub name: String,
    /// Source IP address of the discovery response
    pub ip: String,
}

impl Device {
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
        }
    }
}
