use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use slotmux_core::{MAX_CHANNELS, MAX_DEVICES, MAX_MESSAGE_LEN, RESERVED_CHANNEL};

use crate::cmd::LimitsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct LimitsOutput {
    max_message_len: usize,
    max_channels: usize,
    max_devices: usize,
    reserved_channel: u32,
}

pub fn run(_args: LimitsArgs, format: OutputFormat) -> CliResult<i32> {
    let limits = LimitsOutput {
        max_message_len: MAX_MESSAGE_LEN,
        max_channels: MAX_CHANNELS,
        max_devices: MAX_DEVICES,
        reserved_channel: RESERVED_CHANNEL,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&limits).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LIMIT", "VALUE"])
                .add_row(vec![
                    "max message length".to_string(),
                    limits.max_message_len.to_string(),
                ])
                .add_row(vec![
                    "max channels per device".to_string(),
                    limits.max_channels.to_string(),
                ])
                .add_row(vec!["max devices".to_string(), limits.max_devices.to_string()])
                .add_row(vec![
                    "reserved channel id".to_string(),
                    limits.reserved_channel.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("max-message-len: {}", limits.max_message_len);
            println!("max-channels: {}", limits.max_channels);
            println!("max-devices: {}", limits.max_devices);
            println!("reserved-channel: {}", limits.reserved_channel);
        }
    }

    Ok(SUCCESS)
}
