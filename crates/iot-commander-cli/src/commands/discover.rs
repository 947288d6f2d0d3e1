//! Discover command implementation.

use std::collections::HashSet;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use iot_commander_core::{Device, DiscoveryState};
use tracing::warn;

use crate::cli::DiscoverArgs;
use crate::device::discovery::{build_engine, devices_from};
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the discover command
pub async fn run_discover(args: DiscoverArgs, json: bool) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let engine = build_engine(&args.discovery);

    engine.start_search();
    let mut rx = engine.subscribe();

    let spinner = (!json).then(|| new_spinner(engine.config().duration));
    let mut seen: HashSet<Device> = HashSet::new();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    let snapshot = loop {
        let snapshot = rx.borrow_and_update().clone();

        if let Some(pb) = &spinner {
            for device in &snapshot.devices {
                if seen.insert(device.clone()) {
                    pb.println(format!("  found {} ({})", device.name, device.ip));
                }
            }
        }

        if snapshot.state != DiscoveryState::Searching {
            break snapshot;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break engine.snapshot();
                }
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                warn!("Interrupted, stopping discovery");
                engine.cancel();
            }
        }
    };

    engine.terminate().await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let devices = devices_from(snapshot)?;
    println!("{}", formatter.format_devices(&devices));

    if devices.is_empty() {
        return Err(CliError::NoDevicesFound);
    }

    Ok(())
}

fn new_spinner(duration: Duration) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!(
        "Discovering devices for {:.1}s (Ctrl+C to stop)",
        duration.as_secs_f64()
    ));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
