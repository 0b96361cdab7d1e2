use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod limits;
pub mod recv;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host a device registry at a socket path.
    Serve(ServeArgs),
    /// Send one message to a channel.
    Send(SendArgs),
    /// Receive a channel's current message.
    Recv(RecvArgs),
    /// Show the protocol capacity limits.
    Limits(LimitsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Recv(args) => recv::run(args, format),
        Command::Limits(args) => limits::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket path to bind (the device path).
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to (the device path).
    pub path: PathBuf,
    /// Device id to open.
    #[arg(long, short = 'd', default_value = "0")]
    pub device: u64,
    /// Channel to bind (1 or greater).
    #[arg(long, short = 'c')]
    pub channel: u32,
    /// Message payload as a string.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the message payload from a file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RecvArgs {
    /// Socket path to connect to (the device path).
    pub path: PathBuf,
    /// Device id to open.
    #[arg(long, short = 'd', default_value = "0")]
    pub device: u64,
    /// Channel to bind (1 or greater).
    #[arg(long, short = 'c')]
    pub channel: u32,
}

#[derive(Args, Debug, Default)]
pub struct LimitsArgs {}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
