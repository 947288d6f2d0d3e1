//! Lists the commands a device publishes.

use iot_commander_core::{CommandSchemaClient, ControlConfig, DeviceHttpClient};
use tracing::info;

use super::interruptible;
use crate::cli::SchemaArgs;
use crate::device::discovery::resolve_target;
use crate::error::CliError;
use crate::output::get_formatter;

/// Run the commands command
pub async fn run_commands(
    args: SchemaArgs,
    control: ControlConfig,
    json: bool,
) -> Result<(), CliError> {
    let formatter = get_formatter(json);
    let device = resolve_target(&args.target, &args.discovery).await?;

    let http = DeviceHttpClient::new(&control)?;
    let client = CommandSchemaClient::new(http.clone());

    let commands = interruptible(&http, async {
        client.fetch_schema(&device).await.map_err(CliError::from)
    })
    .await?;

    info!(ip = %device.ip, count = commands.len(), "Fetched command schema");
    println!("{}", formatter.format_schema(&device, &commands));

    Ok(())
}
