use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use slotmux_core::{DeviceRegistry, Session, SlotError};
use slotmux_wire::{write_reply, Reply, Request, Status, WireError, WireReader};
use tracing::{debug, warn};

use crate::error::Result;
use crate::socket::DeviceSocket;

/// Serves one device registry over a socket endpoint.
///
/// Each accepted connection drives exactly one session; the registry and
/// every message it stores outlive all connections and persist until the
/// server itself is dropped.
pub struct SlotServer {
    socket: DeviceSocket,
    registry: Arc<DeviceRegistry>,
    next_conn_id: AtomicU64,
}

impl SlotServer {
    /// Bind at `path` with a fresh registry using production limits.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_registry(path, Arc::new(DeviceRegistry::new()))
    }

    /// Bind at `path` serving an existing registry.
    pub fn with_registry(path: impl AsRef<Path>, registry: Arc<DeviceRegistry>) -> Result<Self> {
        let socket = DeviceSocket::bind(path)?;
        Ok(Self {
            socket,
            registry,
            next_conn_id: AtomicU64::new(1),
        })
    }

    /// The registry this server exposes.
    pub fn registry(&self) -> Arc<DeviceRegistry> {
        self.registry.clone()
    }

    /// Bound socket path.
    pub fn path(&self) -> &Path {
        self.socket.path()
    }

    /// Accept one connection and serve it to completion on the calling
    /// thread.
    pub fn serve_one(&self) -> Result<()> {
        let stream = self.socket.accept()?;
        let conn = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        serve_connection(conn, self.registry.clone(), stream);
        Ok(())
    }

    /// Accept connections until `running` clears, one thread per
    /// connection.
    pub fn serve(&self, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let stream = self.socket.accept()?;
            let conn = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
            let registry = self.registry.clone();
            thread::spawn(move || serve_connection(conn, registry, stream));
        }
        Ok(())
    }
}

fn serve_connection(conn: u64, registry: Arc<DeviceRegistry>, stream: UnixStream) {
    debug!(conn, "serving connection");
    let reader_stream = match stream.try_clone() {
        Ok(stream) => stream,
        Err(err) => {
            warn!(conn, error = %err, "connection setup failed");
            return;
        }
    };
    let mut reader = WireReader::new(reader_stream);
    let mut writer = stream;
    let mut session: Option<Session> = None;

    loop {
        let request = match reader.read_request() {
            Ok(request) => request,
            Err(WireError::ConnectionClosed) => break,
            Err(err) => {
                // The stream may be out of sync; report once and drop.
                warn!(conn, error = %err, "dropping connection on wire error");
                let _ = write_reply(&mut writer, &Reply::error(Status::Malformed, err.to_string()));
                break;
            }
        };

        let (reply, done) = handle_request(&registry, &mut session, request);
        if let Err(err) = write_reply(&mut writer, &reply) {
            warn!(conn, error = %err, "failed writing reply");
            break;
        }
        if done {
            break;
        }
    }
    debug!(conn, "connection finished");
}

/// Apply one request to the connection's session state.
///
/// Returns the reply and whether the connection is done. `Open` must come
/// first; re-opening on a live connection replaces the session with a
/// fresh unbound one, same as close-then-open.
fn handle_request(
    registry: &DeviceRegistry,
    session: &mut Option<Session>,
    request: Request,
) -> (Reply, bool) {
    match request {
        Request::Open { device } => match registry.open(device) {
            Ok(opened) => {
                *session = Some(opened);
                (Reply::ok(), false)
            }
            Err(err) => (reject(&err), false),
        },
        Request::Bind { channel } => match session.as_mut() {
            None => (session_not_open(), false),
            Some(session) => match session.bind(channel) {
                Ok(()) => (Reply::ok(), false),
                Err(err) => (reject(&err), false),
            },
        },
        Request::Send { payload } => match session.as_ref() {
            None => (session_not_open(), false),
            Some(session) => match session.send(&payload) {
                Ok(_accepted) => (Reply::ok(), false),
                Err(err) => (reject(&err), false),
            },
        },
        Request::Recv { capacity } => match session.as_ref() {
            None => (session_not_open(), false),
            Some(session) => match session.receive(capacity) {
                Ok(message) => (Reply::ok_with(message), false),
                Err(err) => (reject(&err), false),
            },
        },
        Request::Close => (Reply::ok(), true),
    }
}

fn reject(err: &SlotError) -> Reply {
    Reply::error(Status::from_slot_error(err), err.to_string())
}

fn session_not_open() -> Reply {
    Reply::error(Status::SessionNotOpen, "no session: open a device first")
}
