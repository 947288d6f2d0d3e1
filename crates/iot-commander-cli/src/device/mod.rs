//! Device communication layer.
//!
//! Schema fetching and dispatch are provided by iot-commander-core.
//! This module provides CLI-specific discovery wrappers.

pub mod discovery;
