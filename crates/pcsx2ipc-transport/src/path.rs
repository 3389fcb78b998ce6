use std::ffi::OsString;
use std::path::PathBuf;

/// File name of the emulator's IPC socket inside the runtime directory.
pub const SOCKET_FILE_NAME: &str = "pcsx2.sock";

/// Runtime directory used when `XDG_RUNTIME_DIR` is not set.
pub const FALLBACK_RUNTIME_DIR: &str = "/tmp";

/// Resolve the socket path from the current process environment.
pub fn default_socket_path() -> PathBuf {
    socket_path_from(std::env::var_os("XDG_RUNTIME_DIR"))
}

/// Resolve the socket path for a given runtime directory value.
///
/// An unset or empty runtime directory falls back to `/tmp`.
pub fn socket_path_from(runtime_dir: Option<OsString>) -> PathBuf {
    let dir = match runtime_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(FALLBACK_RUNTIME_DIR),
    };
    dir.join(SOCKET_FILE_NAME)
}
