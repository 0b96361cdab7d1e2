use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Raw,
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    /// Raw bytes when piped so `recv` composes with shell redirection;
    /// a table when a human is watching.
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Raw
        }
    }
}

#[derive(Serialize)]
struct MessageOutput {
    device: u64,
    channel: u32,
    size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_message(device: u64, channel: u32, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Raw => {
            print_raw(payload);
        }
        OutputFormat::Json => {
            let out = MessageOutput {
                device,
                channel,
                size: payload.len(),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DEVICE", "CHANNEL", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    device.to_string(),
                    channel.to_string(),
                    payload.len().to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "device={} channel={} size={} payload={}",
                device,
                channel,
                payload.len(),
                payload_preview(payload)
            );
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
