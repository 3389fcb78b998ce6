use std::path::PathBuf;
use std::time::Duration;

use pcsx2ipc_protocol::{
    Width, COMMAND_HEADER_SIZE, MAX_REQUEST_SIZE, MAX_RESPONSE_SIZE, REQUEST_HEADER_SIZE,
    RESPONSE_HEADER_SIZE,
};

use crate::error::{BatchError, Result};

/// Send and receive timeout applied to every connection.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Headroom kept free at the end of the request and response buffers.
pub const DEFAULT_OVERFLOW_MARGIN: usize = 0x100;

/// Largest single command: opcode + address + 8-byte value.
pub const MAX_COMMAND_SIZE: usize = COMMAND_HEADER_SIZE + Width::Double.bytes();

/// Configuration for a batching [`crate::Client`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Socket path. `None` resolves `${XDG_RUNTIME_DIR:-/tmp}/pcsx2.sock` at connect time.
    pub socket_path: Option<PathBuf>,
    /// Receive timeout. Default: 10 seconds.
    pub read_timeout: Option<Duration>,
    /// Send timeout. Default: 10 seconds.
    pub write_timeout: Option<Duration>,
    /// Upper bound on one encoded request. Default: 650 000 bytes.
    pub max_request_size: usize,
    /// Upper bound on one response. Default: 450 000 bytes.
    pub max_response_size: usize,
    /// Bytes kept free before the overflow guard flushes. Default: 256.
    pub overflow_margin: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            read_timeout: Some(DEFAULT_TIMEOUT),
            write_timeout: Some(DEFAULT_TIMEOUT),
            max_request_size: MAX_REQUEST_SIZE,
            max_response_size: MAX_RESPONSE_SIZE,
            overflow_margin: DEFAULT_OVERFLOW_MARGIN,
        }
    }
}

impl BatchConfig {
    /// Use an explicit socket path instead of the environment default.
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Apply the same timeout to sends and receives.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self.write_timeout = Some(timeout);
        self
    }

    /// The socket path a connection will use.
    pub fn resolved_socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(pcsx2ipc_transport::default_socket_path)
    }

    /// Encoded request length at which the overflow guard flushes.
    pub fn request_flush_threshold(&self) -> usize {
        self.max_request_size.saturating_sub(self.overflow_margin)
    }

    /// Expected response length at which the overflow guard flushes.
    pub fn response_flush_threshold(&self) -> usize {
        self.max_response_size.saturating_sub(self.overflow_margin)
    }

    /// Check that every limit leaves room for at least one command.
    pub fn validate(&self) -> Result<()> {
        if self.overflow_margin < MAX_COMMAND_SIZE {
            return Err(BatchError::InvalidConfig(format!(
                "overflow margin {} is smaller than the largest command ({MAX_COMMAND_SIZE} bytes)",
                self.overflow_margin
            )));
        }
        if self.max_request_size > u32::MAX as usize {
            return Err(BatchError::InvalidConfig(format!(
                "max request size {} does not fit the 32-bit size header",
                self.max_request_size
            )));
        }
        if self.request_flush_threshold() <= REQUEST_HEADER_SIZE {
            return Err(BatchError::InvalidConfig(format!(
                "max request size {} leaves no room for commands with a {}-byte margin",
                self.max_request_size, self.overflow_margin
            )));
        }
        if self.response_flush_threshold() <= RESPONSE_HEADER_SIZE {
            return Err(BatchError::InvalidConfig(format!(
                "max response size {} leaves no room for values with a {}-byte margin",
                self.max_response_size, self.overflow_margin
            )));
        }
        if matches!(self.read_timeout, Some(d) if d.is_zero())
            || matches!(self.write_timeout, Some(d) if d.is_zero())
        {
            return Err(BatchError::InvalidConfig(
                "socket timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
