//! Command implementations.

pub mod discover;
pub mod schema;
pub mod send;

pub use discover::run_discover;
pub use schema::run_commands;
pub use send::run_send;

use std::future::Future;

use iot_commander_core::DeviceHttpClient;
use tracing::warn;

use crate::error::CliError;

/// Drive `fut` to completion, aborting in-flight device requests on Ctrl+C.
///
/// The future still runs to the end after an interrupt so the cancellation
/// surfaces as its regular error.
pub(crate) async fn interruptible<F, T>(http: &DeviceHttpClient, fut: F) -> Result<T, CliError>
where
    F: Future<Output = Result<T, CliError>>,
{
    tokio::pin!(fut);

    tokio::select! {
        result = &mut fut => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling outstanding requests");
            http.cancel_all();
            fut.await
        }
    }
}
