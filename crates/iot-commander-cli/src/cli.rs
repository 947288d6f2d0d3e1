//! CLI argument definitions using clap.

use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use iot_commander_core::config::DiscoveryConfig;
use iot_commander_core::discovery::{
    BroadcastResolver, StaticBroadcastResolver, SystemBroadcastResolver, DISCOVERY_PORT,
};

/// IoT Commander - discover devices on the local network and send them commands
#[derive(Parser, Debug)]
#[command(name = "iot-commander")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// HTTP request timeout in milliseconds
    #[arg(long, global = true, default_value = "5000", env = "IOT_COMMANDER_TIMEOUT")]
    pub timeout: u64,

    /// HTTP port of the device control endpoint
    #[arg(long, global = true, default_value = "80", env = "IOT_COMMANDER_HTTP_PORT")]
    pub http_port: u16,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover devices on the local subnet
    Discover(DiscoverArgs),

    /// List the commands a device supports
    #[command(name = "commands", alias = "schema")]
    Schema(SchemaArgs),

    /// Send a command to a device
    Send(SendArgs),
}

/// Options for the discovery pass (also used to look up devices by name)
#[derive(Args, Debug, Clone)]
pub struct DiscoveryArgs {
    /// Discovery duration in milliseconds
    #[arg(long, default_value = "5000")]
    pub duration: u64,

    /// UDP discovery port
    #[arg(long, default_value_t = DISCOVERY_PORT)]
    pub port: u16,

    /// Local address and prefix to derive the broadcast address from, e.g. 192.168.1.10/24
    /// (default: first IPv4 interface)
    #[arg(long, value_name = "IP/PREFIX", env = "IOT_COMMANDER_LOCAL_ADDR")]
    pub local_addr: Option<StaticBroadcastResolver>,
}

impl DiscoveryArgs {
    pub fn config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            port: self.port,
            duration: Duration::from_millis(self.duration),
            ..DiscoveryConfig::default()
        }
    }

    pub fn resolver(&self) -> Arc<dyn BroadcastResolver> {
        match self.local_addr {
            Some(resolver) => Arc::new(resolver),
            None => Arc::new(SystemBroadcastResolver),
        }
    }
}

// ==================== Discover ====================

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    #[command(flatten)]
    pub discovery: DiscoveryArgs,
}

// ==================== Commands ====================

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Device IP address or device name
    pub target: String,

    #[command(flatten)]
    pub discovery: DiscoveryArgs,
}

// ==================== Send ====================

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device IP address or device name
    pub target: String,

    /// Command name as listed by `commands`
    pub command: String,

    /// Parameter values as name=value
    #[arg(value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    #[command(flatten)]
    pub discovery: DiscoveryArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "iot-commander",
            "send",
            "192.168.1.20",
            "setTemp",
            "value=21",
            "eco=true",
            "--http-port",
            "8080",
        ])
        .unwrap();

        assert_eq!(cli.http_port, 8080);
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.target, "192.168.1.20");
                assert_eq!(args.command, "setTemp");
                assert_eq!(args.params, vec!["value=21", "eco=true"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_discover_local_addr() {
        let cli = Cli::try_parse_from([
            "iot-commander",
            "discover",
            "--local-addr",
            "192.168.1.10/24",
            "--duration",
            "1500",
        ])
        .unwrap();

        match cli.command {
            Commands::Discover(args) => {
                let resolver = args.discovery.local_addr.unwrap();
                assert_eq!(resolver.prefix_len, 24);
                assert_eq!(args.discovery.config().duration, Duration::from_millis(1500));
                assert_eq!(args.discovery.config().port, 9977);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_commands_alias() {
        let cli = Cli::try_parse_from(["iot-commander", "schema", "lamp"]).unwrap();
        assert!(matches!(cli.command, Commands::Schema(_)));
    }
}
