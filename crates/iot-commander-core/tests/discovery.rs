//! Discovery engine tests against a loopback device simulator.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use iot_commander_core::config::DiscoveryConfig;
use iot_commander_core::discovery::{
    BroadcastResolver, DiscoveryEngine, DiscoveryState, StaticBroadcastResolver, PROBE_MESSAGE,
};
use iot_commander_core::error::DiscoveryError;
use iot_commander_core::Device;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Fake device answering every probe on 127.0.0.1 with each of `replies`.
struct Simulator {
    port: u16,
    probes: Arc<AtomicUsize>,
}

async fn spawn_simulator(replies: Vec<&'static str>) -> Simulator {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = socket.local_addr().unwrap().port();
    let probes = Arc::new(AtomicUsize::new(0));
    let counter = probes.clone();

    tokio::spawn(async move {
        let mut buf = [0u8; 1500];
        loop {
            let (len, from) = match socket.recv_from(&mut buf).await {
                Ok(r) => r,
                Err(_) => break,
            };
            if &buf[..len] != PROBE_MESSAGE.as_bytes() {
                continue;
            }
            counter.fetch_add(1, Ordering::SeqCst);
            for reply in &replies {
                let _ = socket.send_to(reply.as_bytes(), from).await;
            }
        }
    });

    Simulator { port, probes }
}

fn loopback() -> Arc<dyn BroadcastResolver> {
    Arc::new(StaticBroadcastResolver::new(Ipv4Addr::LOCALHOST, 32))
}

fn fast_config(port: u16, duration: Duration) -> DiscoveryConfig {
    DiscoveryConfig {
        port,
        duration,
        receive_timeout: Duration::from_millis(100),
        interval: Duration::from_millis(20),
        ..DiscoveryConfig::default()
    }
}

struct NoAddress;

impl BroadcastResolver for NoAddress {
    fn resolve(&self) -> Result<Ipv4Addr, DiscoveryError> {
        Err(DiscoveryError::Resolution("no IPv4 address available".to_string()))
    }
}

#[tokio::test]
async fn test_duplicate_responses_yield_one_device() {
    let sim = spawn_simulator(vec![
        r#"{"deviceName":"A"}"#,
        r#"{"deviceName":"A"}"#,
    ])
    .await;

    let snapshot = DiscoveryEngine::discover_once(
        fast_config(sim.port, Duration::from_millis(400)),
        loopback(),
    )
    .await;

    assert_eq!(snapshot.state, DiscoveryState::Idle);
    assert_eq!(snapshot.devices, vec![Device::new("A", "127.0.0.1")]);
    assert!(sim.probes.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_noise_is_ignored_and_names_are_distinct_devices() {
    let sim = spawn_simulator(vec![
        "garbage",
        r#"{"action":"discover"}"#,
        r#"{"deviceName":"B"}"#,
        r#"{"deviceName":"A"}"#,
        r#"{"deviceName":42}"#,
    ])
    .await;

    let snapshot = DiscoveryEngine::discover_once(
        fast_config(sim.port, Duration::from_millis(500)),
        loopback(),
    )
    .await;

    assert_eq!(snapshot.state, DiscoveryState::Idle);
    assert_eq!(
        snapshot.devices,
        vec![Device::new("A", "127.0.0.1"), Device::new("B", "127.0.0.1")]
    );
}

#[tokio::test]
async fn test_devices_are_published_while_searching() {
    let sim = spawn_simulator(vec![r#"{"deviceName":"A"}"#]).await;
    let engine = DiscoveryEngine::new(fast_config(sim.port, Duration::from_secs(3)), loopback());
    let mut rx = engine.subscribe();

    assert!(engine.start_search());

    let snapshot = timeout(Duration::from_secs(2), rx.wait_for(|s| !s.devices.is_empty()))
        .await
        .expect("device not published in time")
        .unwrap()
        .clone();

    assert_eq!(snapshot.state, DiscoveryState::Searching);
    assert_eq!(snapshot.devices.len(), 1);

    engine.terminate().await;
}

#[tokio::test]
async fn test_start_while_searching_is_a_no_op() {
    let sim = spawn_simulator(vec![r#"{"deviceName":"A"}"#]).await;
    let engine = DiscoveryEngine::new(fast_config(sim.port, Duration::from_secs(3)), loopback());
    let mut rx = engine.subscribe();

    assert!(engine.start_search());
    timeout(Duration::from_secs(2), rx.wait_for(|s| !s.devices.is_empty()))
        .await
        .expect("device not published in time")
        .unwrap();

    assert!(!engine.start_search());
    assert_eq!(engine.state(), DiscoveryState::Searching);
    assert_eq!(engine.devices(), vec![Device::new("A", "127.0.0.1")]);

    engine.terminate().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_run_one_pass_without_extra_sends() {
    let sim = spawn_simulator(vec![r#"{"deviceName":"A"}"#]).await;
    // Long interval: the winning pass sends once, then sleeps.
    let config = DiscoveryConfig {
        interval: Duration::from_secs(10),
        ..fast_config(sim.port, Duration::from_secs(30))
    };
    let engine = Arc::new(DiscoveryEngine::new(config, loopback()));
    let mut rx = engine.subscribe();

    let starts: Vec<_> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.start_search() })
        })
        .collect();

    let mut wins = 0;
    for start in starts {
        if start.await.unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);

    timeout(Duration::from_secs(2), rx.wait_for(|s| !s.devices.is_empty()))
        .await
        .expect("device not published in time")
        .unwrap();

    for _ in 0..8 {
        assert!(!engine.start_search());
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(sim.probes.load(Ordering::SeqCst), 1);
    assert_eq!(engine.devices(), vec![Device::new("A", "127.0.0.1")]);

    engine.terminate().await;
}

#[tokio::test]
async fn test_dropping_engine_stops_pass() {
    let sim = spawn_simulator(vec![r#"{"deviceName":"A"}"#]).await;
    let engine = DiscoveryEngine::new(fast_config(sim.port, Duration::from_secs(30)), loopback());

    assert!(engine.start_search());
    timeout(Duration::from_secs(2), async {
        while sim.probes.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("pass sent nothing");

    drop(engine);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let after_drop = sim.probes.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(sim.probes.load(Ordering::SeqCst), after_drop);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_start_reaches_new_pass() {
    // Nothing listens on the target port, so a pass only ends when cancelled.
    let port = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    for _ in 0..20 {
        let engine = Arc::new(DiscoveryEngine::new(
            fast_config(port, Duration::from_secs(30)),
            loopback(),
        ));

        let canceller = {
            let engine = engine.clone();
            tokio::spawn(async move {
                while engine.state() != DiscoveryState::Searching {
                    tokio::task::yield_now().await;
                }
                engine.cancel();
            })
        };
        let starter = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.start_search() })
        };

        assert!(starter.await.unwrap());
        canceller.await.unwrap();

        let snapshot = timeout(Duration::from_secs(2), engine.wait_idle())
            .await
            .expect("cancel did not reach the running pass");
        assert_eq!(snapshot.state, DiscoveryState::Idle);
    }
}

#[tokio::test]
async fn test_resolution_failure_sends_nothing() {
    let sim = spawn_simulator(vec![r#"{"deviceName":"A"}"#]).await;
    let engine = DiscoveryEngine::new(
        fast_config(sim.port, Duration::from_millis(300)),
        Arc::new(NoAddress),
    );

    assert!(engine.start_search());
    let snapshot = engine.wait_idle().await;

    assert_eq!(snapshot.state, DiscoveryState::Error);
    assert!(snapshot.devices.is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sim.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancel_ends_pass_early() {
    let sim = spawn_simulator(vec![r#"{"deviceName":"A"}"#]).await;
    let engine = DiscoveryEngine::new(fast_config(sim.port, Duration::from_secs(30)), loopback());
    let mut rx = engine.subscribe();

    assert!(engine.start_search());
    timeout(Duration::from_secs(2), rx.wait_for(|s| !s.devices.is_empty()))
        .await
        .expect("device not published in time")
        .unwrap();

    engine.cancel();

    let snapshot = timeout(Duration::from_secs(2), engine.wait_idle())
        .await
        .expect("pass did not stop after cancel");
    assert_eq!(snapshot.state, DiscoveryState::Idle);
    assert_eq!(snapshot.devices, vec![Device::new("A", "127.0.0.1")]);
}

#[tokio::test]
async fn test_new_search_resets_devices() {
    let sim = spawn_simulator(vec![r#"{"deviceName":"A"}"#]).await;
    let engine = DiscoveryEngine::new(fast_config(sim.port, Duration::from_millis(200)), loopback());

    assert!(engine.start_search());
    assert_eq!(engine.wait_idle().await.devices.len(), 1);

    assert!(engine.start_search());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.state, DiscoveryState::Searching);
    assert!(snapshot.devices.is_empty());

    engine.terminate().await;
    assert_ne!(engine.state(), DiscoveryState::Searching);
}
