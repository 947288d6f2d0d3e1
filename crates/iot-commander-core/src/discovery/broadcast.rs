//! Subnet broadcast address resolution.

use std::net::Ipv4Addr;
use std::str::FromStr;

use if_addrs::{get_if_addrs, IfAddr};

use crate::error::DiscoveryError;

/// Compute the broadcast address of the subnet `ip/prefix_len`.
///
/// Clears the host portion of `ip` and then sets every host bit.
pub fn broadcast_address(ip: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    let host_bits = 32u32.saturating_sub(u32::from(prefix_len));
    let host_mask = if host_bits >= 32 {
        u32::MAX
    } else {
        (1u32 << host_bits) - 1
    };

    let ip = u32::from(ip);
    Ipv4Addr::from((ip & !host_mask) | host_mask)
}

/// Source of the address discovery probes are sent to.
pub trait BroadcastResolver: Send + Sync {
    fn resolve(&self) -> Result<Ipv4Addr, DiscoveryError>;
}

/// Resolves from the first non-loopback IPv4 interface of this machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBroadcastResolver;

impl BroadcastResolver for SystemBroadcastResolver {
    fn resolve(&self) -> Result<Ipv4Addr, DiscoveryError> {
        let interfaces = get_if_addrs()
            .map_err(|e| DiscoveryError::Resolution(format!("interface lookup failed: {}", e)))?;

        let (name, v4) = interfaces
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .find_map(|iface| match iface.addr {
                IfAddr::V4(v4) => Some((iface.name, v4)),
                IfAddr::V6(_) => None,
            })
            .ok_or_else(|| DiscoveryError::Resolution("no IPv4 address available".to_string()))?;

        let prefix_len = u32::from(v4.netmask).leading_ones() as u8;
        let broadcast = broadcast_address(v4.ip, prefix_len);

        tracing::debug!(
            interface = %name,
            ip = %v4.ip,
            prefix_len,
            broadcast = %broadcast,
            "Resolved broadcast address"
        );

        Ok(broadcast)
    }
}

/// Resolves from an explicitly configured local address, e.g. `192.168.1.10/24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticBroadcastResolver {
    pub ip: Ipv4Addr,
    pub prefix_len: u8,
}

impl StaticBroadcastResolver {
    pub fn new(ip: Ipv4Addr, prefix_len: u8) -> Self {
        Self { ip, prefix_len }
    }
}

impl BroadcastResolver for StaticBroadcastResolver {
    fn resolve(&self) -> Result<Ipv4Addr, DiscoveryError> {
        Ok(broadcast_address(self.ip, self.prefix_len))
    }
}

impl FromStr for StaticBroadcastResolver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, prefix) = s
            .split_once('/')
            .ok_or_else(|| format!("expected <ipv4>/<prefix>, got '{}'", s))?;

        let ip: Ipv4Addr = ip
            .parse()
            .map_err(|e| format!("invalid IPv4 address '{}': {}", ip, e))?;
        let prefix_len: u8 = prefix
            .parse()
            .ok()
            .filter(|p| *p <= 32)
            .ok_or_else(|| format!("invalid prefix length '{}'", prefix))?;

        Ok(Self::new(ip, prefix_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_class_c() {
        assert_eq!(
            broadcast_address(Ipv4Addr::new(192, 168, 1, 10), 24),
            Ipv4Addr::new(192, 168, 1, 255)
        );
    }

    #[test]
    fn test_broadcast_odd_prefixes() {
        assert_eq!(
            broadcast_address(Ipv4Addr::new(10, 1, 2, 3), 8),
            Ipv4Addr::new(10, 255, 255, 255)
        );
        assert_eq!(
            broadcast_address(Ipv4Addr::new(172, 16, 5, 4), 20),
            Ipv4Addr::new(172, 16, 15, 255)
        );
        assert_eq!(
            broadcast_address(Ipv4Addr::new(192, 168, 1, 130), 26),
            Ipv4Addr::new(192, 168, 1, 191)
        );
    }

    #[test]
    fn test_broadcast_edges() {
        let ip = Ipv4Addr::new(192, 168, 1, 10);
        assert_eq!(broadcast_address(ip, 32), ip);
        assert_eq!(broadcast_address(ip, 0), Ipv4Addr::BROADCAST);
        assert_eq!(broadcast_address(ip, 40), ip);
    }

    #[test]
    fn test_static_resolver_from_str() {
        let resolver: StaticBroadcastResolver = "192.168.1.10/24".parse().unwrap();
        assert_eq!(resolver.resolve().unwrap(), Ipv4Addr::new(192, 168, 1, 255));

        assert!("192.168.1.10".parse::<StaticBroadcastResolver>().is_err());
        assert!("192.168.1.10/33".parse::<StaticBroadcastResolver>().is_err());
        assert!("fe80::1/64".parse::<StaticBroadcastResolver>().is_err());
    }
}
