use bytes::{Buf, BufMut, Bytes, BytesMut};
use slotmux_core::{SlotError, MAX_MESSAGE_LEN};

use crate::error::{Result, WireError};

/// Request header: magic (2) + opcode (1) + arg (8) + length (2) = 13 bytes.
pub const REQUEST_HEADER_SIZE: usize = 13;

/// Reply header: magic (2) + status (1) + length (2) = 5 bytes.
pub const REPLY_HEADER_SIZE: usize = 5;

/// Magic bytes: "SX" (0x53 0x58).
pub const MAGIC: [u8; 2] = [0x53, 0x58];

/// Maximum request payload: one protocol message.
pub const MAX_REQUEST_PAYLOAD: usize = MAX_MESSAGE_LEN;

/// Maximum reply payload: a received message or an error detail line.
pub const MAX_REPLY_PAYLOAD: usize = 512;

/// Protocol operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Open = 1,
    Bind = 2,
    Send = 3,
    Recv = 4,
    Close = 5,
}

impl TryFrom<u8> for Opcode {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Opcode::Open),
            2 => Ok(Opcode::Bind),
            3 => Ok(Opcode::Send),
            4 => Ok(Opcode::Recv),
            5 => Ok(Opcode::Close),
            other => Err(WireError::UnknownOpcode(other)),
        }
    }
}

/// A decoded protocol request. One connection issues these in sequence,
/// starting with [`Request::Open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Open a session against a device.
    Open { device: u64 },
    /// Bind the session to a channel.
    Bind { channel: u32 },
    /// Replace the bound channel's message.
    Send { payload: Bytes },
    /// Copy the bound channel's message into a buffer of `capacity` bytes.
    Recv { capacity: usize },
    /// End the session.
    Close,
}

impl Request {
    fn opcode(&self) -> Opcode {
        match self {
            Request::Open { .. } => Opcode::Open,
            Request::Bind { .. } => Opcode::Bind,
            Request::Send { .. } => Opcode::Send,
            Request::Recv { .. } => Opcode::Recv,
            Request::Close => Opcode::Close,
        }
    }

    fn arg(&self) -> u64 {
        match self {
            Request::Open { device } => *device,
            Request::Bind { channel } => u64::from(*channel),
            Request::Recv { capacity } => *capacity as u64,
            Request::Send { .. } | Request::Close => 0,
        }
    }

    fn payload(&self) -> &[u8] {
        match self {
            Request::Send { payload } => payload.as_ref(),
            _ => &[],
        }
    }
}

/// Reply status codes. Zero is success; the non-zero codes map one-to-one
/// onto the protocol error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    InvalidChannel = 1,
    NotBound = 2,
    InvalidMessageSize = 3,
    EmptyChannel = 4,
    BufferTooSmall = 5,
    CapacityExceeded = 6,
    ResourceExhausted = 7,
    /// A request other than `Open` arrived before any session was opened.
    SessionNotOpen = 8,
    /// The request could not be honored as framed.
    Malformed = 9,
}

impl Status {
    /// The status code that reports `err` to the remote side.
    pub fn from_slot_error(err: &SlotError) -> Self {
        match err {
            SlotError::InvalidChannel => Status::InvalidChannel,
            SlotError::NotBound => Status::NotBound,
            SlotError::InvalidMessageSize { .. } => Status::InvalidMessageSize,
            SlotError::EmptyChannel { .. } => Status::EmptyChannel,
            SlotError::BufferTooSmall { .. } => Status::BufferTooSmall,
            SlotError::CapacityExceeded { .. } => Status::CapacityExceeded,
            SlotError::ResourceExhausted { .. } => Status::ResourceExhausted,
        }
    }

    /// Stable lowercase name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::InvalidChannel => "invalid-channel",
            Status::NotBound => "not-bound",
            Status::InvalidMessageSize => "invalid-message-size",
            Status::EmptyChannel => "empty-channel",
            Status::BufferTooSmall => "buffer-too-small",
            Status::CapacityExceeded => "capacity-exceeded",
            Status::ResourceExhausted => "resource-exhausted",
            Status::SessionNotOpen => "session-not-open",
            Status::Malformed => "malformed-request",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Status {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Status::Ok),
            1 => Ok(Status::InvalidChannel),
            2 => Ok(Status::NotBound),
            3 => Ok(Status::InvalidMessageSize),
            4 => Ok(Status::EmptyChannel),
            5 => Ok(Status::BufferTooSmall),
            6 => Ok(Status::CapacityExceeded),
            7 => Ok(Status::ResourceExhausted),
            8 => Ok(Status::SessionNotOpen),
            9 => Ok(Status::Malformed),
            other => Err(WireError::UnknownStatus(other)),
        }
    }
}

/// A decoded protocol reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub payload: Bytes,
}

impl Reply {
    /// Success with no payload.
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            payload: Bytes::new(),
        }
    }

    /// Success carrying `payload` (a received message).
    pub fn ok_with(payload: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    /// Failure with a human-readable detail line, truncated to the reply
    /// payload bound.
    pub fn error(status: Status, detail: impl Into<String>) -> Self {
        let mut detail = detail.into().into_bytes();
        detail.truncate(MAX_REPLY_PAYLOAD);
        Self {
            status,
            payload: Bytes::from(detail),
        }
    }

    /// The detail line of an error reply, if printable.
    pub fn detail(&self) -> Option<&str> {
        if self.status == Status::Ok {
            return None;
        }
        std::str::from_utf8(&self.payload).ok().filter(|s| !s.is_empty())
    }
}

/// Encode a request into the wire format.
pub fn encode_request(request: &Request, dst: &mut BytesMut) -> Result<()> {
    let payload = request.payload();
    if payload.len() > MAX_REQUEST_PAYLOAD {
        return Err(WireError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_REQUEST_PAYLOAD,
        });
    }
    dst.reserve(REQUEST_HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u8(request.opcode() as u8);
    dst.put_u64_le(request.arg());
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a request from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete record yet.
/// On success, consumes the record bytes from the buffer.
pub fn decode_request(src: &mut BytesMut) -> Result<Option<Request>> {
    if src.len() < REQUEST_HEADER_SIZE {
        return Ok(None); // Need more data
    }

    if src[0..2] != MAGIC {
        return Err(WireError::InvalidMagic);
    }

    let opcode = Opcode::try_from(src[2])?;
    let arg = u64::from_le_bytes(src[3..11].try_into().unwrap());
    let payload_len = u16::from_le_bytes(src[11..13].try_into().unwrap()) as usize;

    if payload_len > MAX_REQUEST_PAYLOAD {
        return Err(WireError::PayloadTooLarge {
            size: payload_len,
            max: MAX_REQUEST_PAYLOAD,
        });
    }

    let total = REQUEST_HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(REQUEST_HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    let request = match opcode {
        Opcode::Open => Request::Open { device: arg },
        Opcode::Bind => {
            let channel = u32::try_from(arg).map_err(|_| WireError::ValueOutOfRange {
                field: "channel",
                value: arg,
            })?;
            Request::Bind { channel }
        }
        Opcode::Send => Request::Send { payload },
        Opcode::Recv => {
            let capacity = usize::try_from(arg).map_err(|_| WireError::ValueOutOfRange {
                field: "capacity",
                value: arg,
            })?;
            Request::Recv { capacity }
        }
        Opcode::Close => Request::Close,
    };

    Ok(Some(request))
}

/// Encode a reply into the wire format.
pub fn encode_reply(reply: &Reply, dst: &mut BytesMut) -> Result<()> {
    if reply.payload.len() > MAX_REPLY_PAYLOAD {
        return Err(WireError::PayloadTooLarge {
            size: reply.payload.len(),
            max: MAX_REPLY_PAYLOAD,
        });
    }
    dst.reserve(REPLY_HEADER_SIZE + reply.payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u8(reply.status as u8);
    dst.put_u16_le(reply.payload.len() as u16);
    dst.put_slice(&reply.payload);
    Ok(())
}

/// Decode a reply from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete record yet.
pub fn decode_reply(src: &mut BytesMut) -> Result<Option<Reply>> {
    if src.len() < REPLY_HEADER_SIZE {
        return Ok(None); // Need more data
    }

    if src[0..2] != MAGIC {
        return Err(WireError::InvalidMagic);
    }

    let status = Status::try_from(src[2])?;
    let payload_len = u16::from_le_bytes(src[3..5].try_into().unwrap()) as usize;

    if payload_len > MAX_REPLY_PAYLOAD {
        return Err(WireError::PayloadTooLarge {
            size: payload_len,
            max: MAX_REPLY_PAYLOAD,
        });
    }

    let total = REPLY_HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(REPLY_HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Reply { status, payload }))
}
