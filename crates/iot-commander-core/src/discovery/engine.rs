//! Discovery engine.
//!
//! A discovery pass broadcasts a probe on the local subnet every interval and
//! collects the devices that answer, for a fixed duration. At most one pass
//! runs per engine. Observers receive whole snapshots of `(devices, state)`
//! over a watch channel.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::broadcast::{BroadcastResolver, SystemBroadcastResolver};
use super::packet::{parse_discover_response, PROBE_MESSAGE};
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::types::Device;

/// UDP port devices listen on for probes
pub const DISCOVERY_PORT: u16 = 9977;

/// Length of one discovery pass
pub const SEARCH_DURATION: Duration = Duration::from_millis(5000);

/// Upper bound on a single receive, so cancellation and the pass deadline are honored
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Pause between probes
pub const SEARCH_INTERVAL: Duration = Duration::from_millis(500);

/// Largest datagram accepted
pub const RECEIVE_BUFFER_SIZE: usize = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DiscoveryState {
    Idle = 0,
    Searching = 1,
    /// The last pass could not start (no IPv4 address, socket failure)
    Error = 2,
}

impl DiscoveryState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => DiscoveryState::Searching,
            2 => DiscoveryState::Error,
            _ => DiscoveryState::Idle,
        }
    }
}

/// What observers see. Replaced as a whole on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoverySnapshot {
    /// Discovered devices, sorted by IP then name
    pub devices: Vec<Device>,
    pub state: DiscoveryState,
}

impl Default for DiscoverySnapshot {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            state: DiscoveryState::Idle,
        }
    }
}

/// Create a non-blocking UDP socket allowed to send broadcasts.
pub fn create_broadcast_socket() -> Result<UdpSocket, std::io::Error> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    socket.set_broadcast(true)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    socket.bind(&addr.into())?;

    socket.set_nonblocking(true)?;

    UdpSocket::from_std(socket.into())
}

struct Shared {
    state: AtomicU8,
    snapshot: watch::Sender<DiscoverySnapshot>,
}

impl Shared {
    fn state(&self) -> DiscoveryState {
        DiscoveryState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn publish_devices(&self, found: &HashSet<Device>) {
        let devices = sorted(found);
        self.snapshot.send_modify(|snapshot| snapshot.devices = devices);
    }

    /// Publish the final snapshot of a pass and release the single-flight slot.
    ///
    /// The atomic is stored while the snapshot is locked, so a pass started
    /// right after can never have its snapshot overwritten by this one.
    fn finish(&self, devices: Vec<Device>, state: DiscoveryState) {
        self.snapshot.send_modify(|snapshot| {
            snapshot.devices = devices;
            snapshot.state = state;
            self.state.store(state as u8, Ordering::Release);
        });
    }
}

fn sorted(found: &HashSet<Device>) -> Vec<Device> {
    let mut devices: Vec<Device> = found.iter().cloned().collect();
    devices.sort_by(|a, b| a.ip.cmp(&b.ip).then_with(|| a.name.cmp(&b.name)));
    devices
}

struct Worker {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Discovery engine. One instance per controller session.
///
/// Dropping the engine drops the cancel signal of the running pass, which
/// stops it at its next check point.
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    resolver: Arc<dyn BroadcastResolver>,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig, resolver: Arc<dyn BroadcastResolver>) -> Self {
        let (snapshot, _) = watch::channel(DiscoverySnapshot::default());

        Self {
            config,
            resolver,
            shared: Arc::new(Shared {
                state: AtomicU8::new(DiscoveryState::Idle as u8),
                snapshot,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Engine with protocol defaults, resolving from the system interfaces.
    pub fn with_defaults() -> Self {
        Self::new(DiscoveryConfig::default(), Arc::new(SystemBroadcastResolver))
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Start a discovery pass on a background task.
    ///
    /// Returns `false`, without touching the current results, when a pass
    /// is already running. Must be called from within a tokio runtime.
    pub fn start_search(&self) -> bool {
        // Held until the new worker is stored, so `cancel` and `terminate`
        // always reach the pass that won the state transition.
        let mut worker = self.lock_worker();

        let started = self
            .shared
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != DiscoveryState::Searching as u8)
                    .then_some(DiscoveryState::Searching as u8)
            })
            .is_ok();

        if !started {
            debug!("Discovery pass already running");
            return false;
        }

        self.shared.snapshot.send_replace(DiscoverySnapshot {
            devices: Vec::new(),
            state: DiscoveryState::Searching,
        });

        let (cancel, cancel_rx) = watch::channel(false);
        let pass = SearchPass {
            config: self.config.clone(),
            resolver: Arc::clone(&self.resolver),
            shared: Arc::clone(&self.shared),
        };
        let handle = tokio::spawn(pass.run(cancel_rx));

        *worker = Some(Worker { cancel, handle });
        true
    }

    /// Ask the running pass to stop at its next check point.
    pub fn cancel(&self) {
        if let Some(worker) = self.lock_worker().as_ref() {
            worker.cancel.send_replace(true);
        }
    }

    /// Cancel the running pass and wait for its task to end.
    pub async fn terminate(&self) {
        let worker = self.lock_worker().take();

        if let Some(worker) = worker {
            worker.cancel.send_replace(true);
            if let Err(e) = worker.handle.await {
                warn!(error = %e, "Discovery task ended abnormally");
            }
        }
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DiscoverySnapshot> {
        self.shared.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> DiscoverySnapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn state(&self) -> DiscoveryState {
        self.shared.state()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.shared.snapshot.borrow().devices.clone()
    }

    /// Wait until no pass is running and return the final snapshot.
    pub async fn wait_idle(&self) -> DiscoverySnapshot {
        let mut rx = self.subscribe();
        let done = match rx.wait_for(|s| s.state != DiscoveryState::Searching).await {
            Ok(snapshot) => Some(snapshot.clone()),
            Err(_) => None,
        };
        done.unwrap_or_else(|| self.snapshot())
    }

    /// Run a single pass to completion and return its result.
    pub async fn discover_once(
        config: DiscoveryConfig,
        resolver: Arc<dyn BroadcastResolver>,
    ) -> DiscoverySnapshot {
        let engine = Self::new(config, resolver);
        engine.start_search();
        let snapshot = engine.wait_idle().await;
        engine.terminate().await;
        snapshot
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves once the cancel flag is set or its sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|stop| *stop).await;
}

struct SearchPass {
    config: DiscoveryConfig,
    resolver: Arc<dyn BroadcastResolver>,
    shared: Arc<Shared>,
}

impl SearchPass {
    async fn run(self, mut cancel: watch::Receiver<bool>) {
        match self.search(&mut cancel).await {
            Ok(found) => {
                info!(count = found.len(), "Discovery pass finished");
                self.shared.finish(sorted(&found), DiscoveryState::Idle);
            }
            Err(e) => {
                warn!(error = %e, "Discovery pass failed");
                self.shared.finish(Vec::new(), DiscoveryState::Error);
            }
        }
    }

    async fn search(
        &self,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<HashSet<Device>, DiscoveryError> {
        let broadcast = self.resolver.resolve()?;
        let socket = create_broadcast_socket().map_err(DiscoveryError::Socket)?;
        let target = SocketAddrV4::new(broadcast, self.config.port);

        info!(broadcast = %target, "Discovering devices");

        let mut found = HashSet::new();
        let mut buf = vec![0u8; self.config.buffer_size];
        let deadline = Instant::now() + self.config.duration;

        while Instant::now() < deadline {
            if *cancel.borrow() {
                break;
            }

            if let Err(e) = socket.send_to(PROBE_MESSAGE.as_bytes(), target).await {
                warn!(error = %e, "Failed to send discovery probe");
            }

            let received = tokio::select! {
                r = timeout(self.config.receive_timeout, socket.recv_from(&mut buf)) => r,
                _ = cancelled(cancel) => break,
            };

            match received {
                Ok(Ok((len, addr))) => match parse_discover_response(&buf[..len]) {
                    Ok(response) => {
                        let device = Device::new(response.device_name, addr.ip().to_string());
                        if found.insert(device) {
                            debug!(from = %addr, "Discovered device");
                            self.shared.publish_devices(&found);
                        }
                    }
                    Err(e) => {
                        debug!(from = %addr, len, error = %e, "Ignoring non-discovery packet");
                    }
                },
                Ok(Err(e)) => {
                    debug!(error = %e, "UDP receive error");
                }
                Err(_) => {
                    // Timeout, probe again
                }
            }

            tokio::select! {
                _ = sleep(self.config.interval) => {}
                _ = cancelled(cancel) => break,
            }
        }

        Ok(found)
    }
}
