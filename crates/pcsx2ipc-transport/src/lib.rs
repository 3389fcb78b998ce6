//! Unix domain socket transport for the PCSX2 memory IPC protocol.
//!
//! The emulator listens on a stream socket at `${XDG_RUNTIME_DIR}/pcsx2.sock`
//! (or `/tmp/pcsx2.sock`). Every batch opens its own connection, sends one
//! request and reads one response, so this layer only deals with resolving
//! the path, connecting with timeouts, and handing back an [`IpcStream`].
//!
//! Unix only.

#![cfg(unix)]

pub mod error;
pub mod path;
pub mod traits;
pub mod uds;

pub use error::{Result, TransportError};
pub use path::{default_socket_path, socket_path_from, SOCKET_FILE_NAME};
pub use traits::IpcStream;
pub use uds::{connect, connect_with_timeouts, MAX_PATH_LEN};
