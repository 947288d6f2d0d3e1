//! UDP device discovery module.
//!
//! Provides broadcast address resolution, the probe/response wire format and
//! the discovery engine that runs timed search passes.

pub mod broadcast;
pub mod engine;
pub mod packet;

pub use broadcast::{
    broadcast_address, BroadcastResolver, StaticBroadcastResolver, SystemBroadcastResolver,
};
pub use engine::{
    create_broadcast_socket, DiscoveryEngine, DiscoverySnapshot, DiscoveryState, DISCOVERY_PORT,
    RECEIVE_BUFFER_SIZE, RECEIVE_TIMEOUT, SEARCH_DURATION, SEARCH_INTERVAL,
};
pub use packet::{parse_discover_response, DiscoverResponse, PROBE_MESSAGE};
