use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{NodeError, Result};

/// The node's Unix-domain-socket endpoint.
///
/// The socket path is the device-path analog: processes that agree on it
/// reach the same registry. The socket file is created with owner-only
/// permissions and unlinked again when the endpoint is dropped.
pub struct DeviceSocket {
    listener: UnixListener,
    path: PathBuf,
}

impl DeviceSocket {
    /// Permission mode for created socket paths.
    const SOCKET_MODE: u32 = 0o600;

    /// Maximum socket path length (`sockaddr_un.sun_path`): 108 bytes on
    /// Linux, 104 elsewhere.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen at `path`.
    ///
    /// A stale socket file left by a previous node is removed first; any
    /// other kind of file at the path is refused.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(NodeError::PathTooLong {
                path,
                len,
                max: Self::MAX_PATH_LEN,
            });
        }

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| NodeError::Bind {
                path: path.clone(),
                source: e,
            })?;
            if !metadata.file_type().is_socket() {
                return Err(NodeError::Bind {
                    path,
                    source: std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                });
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(|e| NodeError::Bind {
                path: path.clone(),
                source: e,
            })?;
        }

        let listener = UnixListener::bind(&path).map_err(|e| NodeError::Bind {
            path: path.clone(),
            source: e,
        })?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(Self::SOCKET_MODE))
            .map_err(|e| NodeError::Bind {
                path: path.clone(),
                source: e,
            })?;

        info!(?path, "device socket listening");
        Ok(Self { listener, path })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().map_err(NodeError::Accept)?;
        debug!("accepted connection");
        Ok(stream)
    }

    /// Connect to a listening node (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<UnixStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| NodeError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to device socket");
        Ok(stream)
    }

    /// The path this endpoint is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeviceSocket {
    fn drop(&mut self) {
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket() {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("slotmux-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn bind_accept_connect() {
        let dir = temp_dir("sock");
        let sock_path = dir.join("node.sock");

        let endpoint = DeviceSocket::bind(&sock_path).expect("bind should succeed");
        assert!(sock_path.exists());

        let path_clone = sock_path.clone();
        let client = std::thread::spawn(move || {
            let mut stream = DeviceSocket::connect(&path_clone).expect("connect should succeed");
            stream.write_all(b"ping").expect("write should succeed");
        });

        let mut server = endpoint.accept().expect("accept should succeed");
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).expect("read should succeed");
        assert_eq!(&buf, b"ping");
        client.join().expect("client thread should finish");

        drop(endpoint);
        assert!(!sock_path.exists(), "socket file should be removed on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn bind_rejects_overlong_path() {
        let long_path = "/tmp/".to_string() + &"s".repeat(200) + ".sock";
        assert!(matches!(
            DeviceSocket::bind(&long_path),
            Err(NodeError::PathTooLong { .. })
        ));
    }

    #[test]
    fn bind_refuses_existing_regular_file() {
        let dir = temp_dir("regular");
        let sock_path = dir.join("taken");
        std::fs::write(&sock_path, b"not a socket").expect("file should be writable");

        assert!(matches!(
            DeviceSocket::bind(&sock_path),
            Err(NodeError::Bind { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn bind_replaces_stale_socket() {
        let dir = temp_dir("stale");
        let sock_path = dir.join("node.sock");

        let first = DeviceSocket::bind(&sock_path).expect("first bind should succeed");
        // Simulate a node that died without cleanup.
        std::mem::forget(first);

        let second = DeviceSocket::bind(&sock_path).expect("rebind should replace stale socket");
        assert!(sock_path.exists());
        drop(second);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
