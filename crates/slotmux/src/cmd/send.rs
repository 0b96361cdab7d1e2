use std::fs;

use slotmux_node::SlotClient;
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{node_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

pub fn run(args: SendArgs, _format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;

    let mut client =
        SlotClient::connect(&args.path).map_err(|err| node_error("connect failed", err))?;
    client
        .open(args.device)
        .map_err(|err| node_error("open failed", err))?;
    client
        .bind(args.channel)
        .map_err(|err| node_error("bind failed", err))?;
    let accepted = client
        .send(&payload)
        .map_err(|err| node_error("send failed", err))?;
    client.close().map_err(|err| node_error("close failed", err))?;

    info!(
        device = args.device,
        channel = args.channel,
        accepted,
        "message sent"
    );
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Err(CliError::new(USAGE, "one of --data or --file is required"))
}
