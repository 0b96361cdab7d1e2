use std::io::{ErrorKind, Read, Write};

use bytes::BytesMut;

use crate::codec::{decode_reply, decode_request, encode_reply, encode_request, Reply, Request};
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete protocol records from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete records.
/// The server side calls [`WireReader::read_request`], the client side
/// [`WireReader::read_reply`]; both share the buffering logic.
pub struct WireReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> WireReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read the next complete request (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached
    /// between records.
    pub fn read_request(&mut self) -> Result<Request> {
        loop {
            if let Some(request) = decode_request(&mut self.buf)? {
                return Ok(request);
            }
            self.fill()?;
        }
    }

    /// Read the next complete reply (blocking).
    pub fn read_reply(&mut self) -> Result<Reply> {
        loop {
            if let Some(reply) = decode_reply(&mut self.buf)? {
                return Ok(reply);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        };
        if read == 0 {
            return Err(WireError::ConnectionClosed);
        }
        self.buf.extend_from_slice(&chunk[..read]);
        Ok(())
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Encode and write one request, flushing the stream.
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let mut buf = BytesMut::new();
    encode_request(request, &mut buf)?;
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Encode and write one reply, flushing the stream.
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    let mut buf = BytesMut::new();
    encode_reply(reply, &mut buf)?;
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::Bytes;

    use super::*;
    use crate::codec::Status;

    #[test]
    fn reads_requests_across_partial_chunks() {
        let mut wire = Vec::new();
        write_request(&mut wire, &Request::Open { device: 1 }).unwrap();
        write_request(
            &mut wire,
            &Request::Send {
                payload: Bytes::from_static(b"chunked"),
            },
        )
        .unwrap();

        // A reader over a one-byte-at-a-time stream still yields complete
        // records.
        struct Dribble(Cursor<Vec<u8>>);
        impl Read for Dribble {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let n = 1.min(buf.len());
                self.0.read(&mut buf[..n])
            }
        }

        let mut reader = WireReader::new(Dribble(Cursor::new(wire)));
        assert_eq!(reader.read_request().unwrap(), Request::Open { device: 1 });
        assert_eq!(
            reader.read_request().unwrap(),
            Request::Send {
                payload: Bytes::from_static(b"chunked")
            }
        );
    }

    #[test]
    fn eof_between_records_is_connection_closed() {
        let mut reader = WireReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(
            reader.read_request(),
            Err(WireError::ConnectionClosed)
        ));
    }

    #[test]
    fn reply_stream_roundtrip() {
        let mut wire = Vec::new();
        write_reply(&mut wire, &Reply::ok_with(Bytes::from_static(b"hi"))).unwrap();
        write_reply(&mut wire, &Reply::error(Status::EmptyChannel, "nothing")).unwrap();

        let mut reader = WireReader::new(Cursor::new(wire));
        let first = reader.read_reply().unwrap();
        assert_eq!(first.status, Status::Ok);
        assert_eq!(first.payload.as_ref(), b"hi");

        let second = reader.read_reply().unwrap();
        assert_eq!(second.status, Status::EmptyChannel);
        assert_eq!(second.detail(), Some("nothing"));
    }
}
