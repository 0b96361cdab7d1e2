use slotmux_core::MAX_MESSAGE_LEN;
use slotmux_node::SlotClient;

use crate::cmd::RecvArgs;
use crate::exit::{node_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: RecvArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client =
        SlotClient::connect(&args.path).map_err(|err| node_error("connect failed", err))?;
    client
        .open(args.device)
        .map_err(|err| node_error("open failed", err))?;
    client
        .bind(args.channel)
        .map_err(|err| node_error("bind failed", err))?;
    let message = client
        .recv(MAX_MESSAGE_LEN)
        .map_err(|err| node_error("recv failed", err))?;
    client.close().map_err(|err| node_error("close failed", err))?;

    print_message(args.device, args.channel, &message, format);
    Ok(SUCCESS)
}
