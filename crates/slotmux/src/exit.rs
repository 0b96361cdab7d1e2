use std::fmt;
use std::io;

use slotmux_node::NodeError;
use slotmux_wire::{Status, WireError};

// Exit code constants; sysexits-adjacent where a match exists.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn node_error(context: &str, err: NodeError) -> CliError {
    match err {
        NodeError::Bind { source, .. }
        | NodeError::Connect { source, .. }
        | NodeError::Accept(source)
        | NodeError::Io(source) => io_error(context, source),
        NodeError::Wire(WireError::Io(source)) => io_error(context, source),
        NodeError::Wire(WireError::PayloadTooLarge { .. }) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        NodeError::Wire(other) => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
        NodeError::Rejected { status, detail } => {
            CliError::new(status_code(status), format!("{context}: {detail}"))
        }
        NodeError::PathTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

fn status_code(status: Status) -> i32 {
    match status {
        Status::Ok => SUCCESS,
        Status::InvalidChannel => USAGE,
        Status::InvalidMessageSize | Status::BufferTooSmall => DATA_INVALID,
        Status::EmptyChannel | Status::CapacityExceeded | Status::ResourceExhausted => FAILURE,
        // The front ends always open and bind before anything else, so
        // these indicate a protocol bug rather than misuse.
        Status::NotBound | Status::SessionNotOpen | Status::Malformed => INTERNAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_status_maps_to_exit_code() {
        let err = node_error(
            "recv failed",
            NodeError::Rejected {
                status: Status::EmptyChannel,
                detail: "channel 7 holds no message".to_string(),
            },
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.contains("channel 7"));
    }

    #[test]
    fn oversize_payload_is_data_invalid() {
        let err = node_error(
            "send failed",
            NodeError::Wire(WireError::PayloadTooLarge { size: 129, max: 128 }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn connection_refused_is_plain_failure() {
        let err = node_error(
            "connect failed",
            NodeError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
        );
        assert_eq!(err.code, FAILURE);
    }
}
