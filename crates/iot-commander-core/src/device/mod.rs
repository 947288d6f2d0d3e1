//! Device communication layer.
//!
//! Provides schema fetching and command dispatch over HTTP.

pub mod dispatch;
pub mod http;
pub mod schema;

pub use dispatch::CommandDispatcher;
pub use http::{DeviceHttpClient, HttpFailure, HttpResponse};
pub use schema::CommandSchemaClient;
