//! Client side of the emulator's Unix domain socket.

use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// Unix `sockaddr_un.sun_path` is 108 bytes on Linux, 104 on macOS and the BSDs.
#[cfg(target_os = "linux")]
pub const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
pub const MAX_PATH_LEN: usize = 104;

/// Connect to the emulator socket (blocking, no timeouts).
pub fn connect(path: impl AsRef<Path>) -> Result<IpcStream> {
    let path = path.as_ref();
    check_path_len(path)?;

    let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(?path, "connected to unix domain socket");
    Ok(IpcStream::from_unix(stream))
}

/// Connect and apply send/receive timeouts before any byte is exchanged.
pub fn connect_with_timeouts(
    path: impl AsRef<Path>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
) -> Result<IpcStream> {
    let stream = connect(path)?;
    stream.set_timeouts(read_timeout, write_timeout)?;
    Ok(stream)
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}
