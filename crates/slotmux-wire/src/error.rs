/// Errors that can occur while encoding or decoding protocol records.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The record header contains an invalid magic number.
    #[error("invalid record magic (expected 0x5358 \"SX\")")]
    InvalidMagic,

    /// The request carries an opcode this protocol does not define.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// The reply carries a status this protocol does not define.
    #[error("unknown status {0}")]
    UnknownStatus(u8),

    /// The payload exceeds the protocol bound for this record kind.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A header field does not fit the operation it addresses.
    #[error("{field} out of range ({value})")]
    ValueOutOfRange { field: &'static str, value: u64 },

    /// An I/O error occurred while reading or writing records.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete record was received.
    #[error("connection closed (incomplete record)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, WireError>;
