//! Request/reply wire codec for the slotmux protocol.
//!
//! One connection carries one session. Every record is framed with:
//! - A 2-byte magic number ("SX") for stream synchronization
//! - A 1-byte opcode (requests) or status (replies)
//! - A 8-byte little-endian argument (requests only)
//! - A 2-byte little-endian payload length
//!
//! Request payloads are bounded by the protocol's maximum message size, so
//! oversized sends are rejected before they reach any channel state.
//! Decoding is incremental: a partial record yields "need more data",
//! never a partial parse.

pub mod codec;
pub mod error;
pub mod stream;

pub use codec::{
    decode_reply, decode_request, encode_reply, encode_request, Opcode, Reply, Request, Status,
    MAGIC, MAX_REPLY_PAYLOAD, MAX_REQUEST_PAYLOAD, REPLY_HEADER_SIZE, REQUEST_HEADER_SIZE,
};
pub use error::{Result, WireError};
pub use stream::{write_reply, write_request, WireReader};
