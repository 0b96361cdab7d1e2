use std::os::unix::net::UnixStream;
use std::path::Path;

use bytes::Bytes;
use slotmux_wire::{write_request, Reply, Request, Status, WireReader};
use tracing::debug;

use crate::error::{NodeError, Result};
use crate::socket::DeviceSocket;

/// Blocking client for a slotmux node.
///
/// Mirrors the five protocol operations one-to-one. Every call sends one
/// request and waits for its reply; a non-OK status comes back as
/// [`NodeError::Rejected`] carrying the node's diagnostic line.
pub struct SlotClient {
    reader: WireReader<UnixStream>,
    writer: UnixStream,
}

impl SlotClient {
    /// Connect to the node listening at `path`.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let writer = DeviceSocket::connect(path)?;
        let reader = WireReader::new(writer.try_clone()?);
        Ok(Self { reader, writer })
    }

    /// Open a session against `device`. Must precede every other call and
    /// may be repeated to start over with a fresh unbound session.
    pub fn open(&mut self, device: u64) -> Result<()> {
        self.round_trip(Request::Open { device })?;
        debug!(device, "session opened");
        Ok(())
    }

    /// Bind the session to `channel`.
    pub fn bind(&mut self, channel: u32) -> Result<()> {
        self.round_trip(Request::Bind { channel })?;
        Ok(())
    }

    /// Replace the bound channel's message with `payload`. Returns the
    /// number of bytes accepted.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        self.round_trip(Request::Send {
            payload: Bytes::copy_from_slice(payload),
        })?;
        Ok(payload.len())
    }

    /// Copy the bound channel's message into a buffer of `capacity` bytes.
    pub fn recv(&mut self, capacity: usize) -> Result<Vec<u8>> {
        let reply = self.round_trip(Request::Recv { capacity })?;
        Ok(reply.payload.to_vec())
    }

    /// End the session. The channel's stored message is unaffected.
    pub fn close(mut self) -> Result<()> {
        self.round_trip(Request::Close)?;
        Ok(())
    }

    fn round_trip(&mut self, request: Request) -> Result<Reply> {
        write_request(&mut self.writer, &request)?;
        let reply = self.reader.read_reply()?;
        if reply.status != Status::Ok {
            return Err(NodeError::Rejected {
                status: reply.status,
                detail: reply
                    .detail()
                    .unwrap_or(reply.status.name())
                    .to_string(),
            });
        }
        Ok(reply)
    }
}
