//! `stackport capture status|mac`: save structured device output as JSON.
//!
//! Written files feed `compare ... --records PATH`, so a comparison can run
//! after the legacy stack has been unplugged.

use std::path::Path;

use serde::Serialize;

use stackport_core::{
    CommandOutput, INTERFACE_STATUS_COMMAND, MAC_TABLE_COMMAND, RetrieveOptions, SshConnector,
    retrieve,
};

use crate::cli::{CaptureArgs, CaptureCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(cmd: CaptureCommand, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_config(global)?;
    let (args, command, profile) = match cmd {
        CaptureCommand::Status(args) => (args, INTERFACE_STATUS_COMMAND, config.device.profile()),
        CaptureCommand::Mac(args) => (args, MAC_TABLE_COMMAND, config.device.mac_profile()),
    };
    let CaptureArgs { host, out } = args;

    let credentials = super::device_credentials(global)?;
    let options = RetrieveOptions {
        read_timeout: profile.read_timeout,
        structured: true,
    };
    let retrieved = retrieve(&SshConnector, &host, &credentials, &profile, command, options).await?;

    let count = match &retrieved.output {
        CommandOutput::InterfaceStatus(rows) => write_records(&out, rows)?,
        CommandOutput::MacTable(rows) => write_records(&out, rows)?,
        CommandOutput::Text(_) => {
            return Err(CliError::Internal(format!(
                "`{command}` returned unparsed output"
            )));
        }
    };

    tracing::info!(host = %host, hostname = %retrieved.hostname, count, "records captured");
    output::print_output(
        &format!(
            "Wrote {count} records from {} to {}",
            retrieved.hostname,
            out.display()
        ),
        global.quiet,
    );
    Ok(())
}

fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize, CliError> {
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(path, json)?;
    Ok(rows.len())
}
