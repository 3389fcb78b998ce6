use pcsx2ipc_protocol::ProtocolError;
use pcsx2ipc_transport::TransportError;

/// Errors that abort a batch.
///
/// Every variant means the batch was not applied: no read destination has
/// been written and the caller should treat the whole batch as failed.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The socket could not be opened (emulator not running, wrong path).
    #[error("connection failed: {0}")]
    Connection(#[source] TransportError),

    /// The request could not be written in full.
    #[error("failed to write command buffer: {0}")]
    Transmit(#[source] ProtocolError),

    /// The response header declared more bytes than allowed.
    #[error("response too big ({size} bytes, max {max})")]
    ResponseTooLarge { size: usize, max: usize },

    /// The connection ended, failed, or timed out before the full response arrived.
    #[error("failed to read response: {0}")]
    ShortRead(#[source] ProtocolError),

    /// The emulator answered with a non-OK status byte.
    #[error("emulator responded with status {status:#04x} (IPC_FAIL)")]
    RemoteFailure { status: u8 },

    /// The response does not line up with the commands that were sent.
    #[error("protocol desync: {0}")]
    ProtocolDesync(String),

    /// The configured limits cannot hold a single command.
    #[error("invalid batch configuration: {0}")]
    InvalidConfig(String),
}

impl BatchError {
    /// Whether this error came from an expired socket timeout.
    pub fn is_timeout(&self) -> bool {
        let io = match self {
            BatchError::ShortRead(ProtocolError::Io(err))
            | BatchError::Transmit(ProtocolError::Io(err)) => err,
            BatchError::Connection(TransportError::Io(err)) => err,
            _ => return false,
        };
        matches!(
            io.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        )
    }

    /// Classify a failure while writing the request.
    pub(crate) fn from_transmit(err: ProtocolError) -> Self {
        BatchError::Transmit(err)
    }

    /// Classify a failure while receiving the response.
    pub(crate) fn from_receive(err: ProtocolError) -> Self {
        match err {
            ProtocolError::ResponseTooLarge { size, max } => {
                BatchError::ResponseTooLarge { size, max }
            }
            ProtocolError::MalformedResponse { .. } | ProtocolError::UnknownTag { .. } => {
                BatchError::ProtocolDesync(err.to_string())
            }
            other => BatchError::ShortRead(other),
        }
    }
}

impl From<TransportError> for BatchError {
    fn from(err: TransportError) -> Self {
        BatchError::Connection(err)
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
