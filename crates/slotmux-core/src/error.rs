/// Errors that can occur in slot protocol operations.
///
/// Every kind is recoverable at the call site and none is retried
/// internally. A failed operation leaves no partial state behind: a failed
/// bind keeps the session's previous binding, a failed send keeps the
/// channel's previous message.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// Channel id 0 is reserved for the unbound state.
    #[error("channel id 0 is reserved and cannot be bound")]
    InvalidChannel,

    /// The session has not bound a channel yet.
    #[error("session is not bound to a channel")]
    NotBound,

    /// Send payload length outside the accepted range.
    #[error("invalid message size ({len} bytes, accepted range 1..={max})")]
    InvalidMessageSize { len: usize, max: usize },

    /// Receive on a channel that holds no message.
    #[error("channel {channel} holds no message")]
    EmptyChannel { channel: u32 },

    /// Receive destination smaller than the stored message.
    #[error("destination capacity {capacity} too small for {len}-byte message")]
    BufferTooSmall { capacity: usize, len: usize },

    /// Channel creation would exceed the device's channel ceiling.
    #[error("channel capacity exceeded ({max} channels per device)")]
    CapacityExceeded { max: usize },

    /// The device id is outside the registry's addressable range.
    #[error("device {device} out of range ({max} devices addressable)")]
    ResourceExhausted { device: u64, max: usize },
}

pub type Result<T> = std::result::Result<T, SlotError>;
