use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use slotmux_node::SlotServer;
use tracing::info;

use crate::cmd::ServeArgs;
use crate::exit::{node_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let server = SlotServer::bind(&args.path).map_err(|err| node_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(path = %args.path.display(), "serving device registry");
    match server.serve(&running) {
        Ok(()) => Ok(SUCCESS),
        // Ctrl-C interrupts the blocking accept; that is a clean exit.
        Err(_) if !running.load(Ordering::SeqCst) => Ok(SUCCESS),
        Err(err) => Err(node_error("accept failed", err)),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
