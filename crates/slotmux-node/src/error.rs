use std::path::PathBuf;

use slotmux_wire::{Status, WireError};

/// Errors that can occur in node operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Failed to bind the socket endpoint.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to a node's socket endpoint.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Wire-level encode/decode or stream failure.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The node refused the request; `detail` is its diagnostic line.
    #[error("request rejected ({status}): {detail}")]
    Rejected { status: Status, detail: String },

    /// An I/O error occurred on a connection.
    #[error("node I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NodeError>;
