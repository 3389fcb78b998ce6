/// Errors that can occur while encoding, decoding, or exchanging messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A command buffer contains a byte that is not a known opcode.
    #[error("corrupted command buffer: unknown opcode {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// A command buffer ends in the middle of a command.
    #[error("truncated command at offset {offset} ({needed} bytes needed, {available} available)")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The size header disagrees with the number of bytes present.
    #[error("size header declares {declared} bytes but buffer holds {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    /// The encoded request exceeds the configured maximum.
    #[error("request too large ({size} bytes, max {max})")]
    RequestTooLarge { size: usize, max: usize },

    /// The response header declares more bytes than the configured maximum.
    #[error("response too big ({size} bytes, max {max})")]
    ResponseTooLarge { size: usize, max: usize },

    /// The response header declares fewer bytes than a status-carrying header.
    #[error("malformed response: declared size {size} is smaller than the response header")]
    MalformedResponse { size: usize },

    /// An I/O error occurred while reading or writing.
    #[error("protocol I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection before the full message was exchanged.
    #[error("connection closed after {received} bytes (incomplete message)")]
    ConnectionClosed { received: usize },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
