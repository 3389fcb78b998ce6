use std::io::{ErrorKind, Write};

use tracing::trace;

use crate::codec::MAX_REQUEST_SIZE;
use crate::error::{ProtocolError, Result};

/// Writes complete, already-encoded requests to any `Write` stream.
pub struct RequestWriter<T> {
    inner: T,
    max_request_size: usize,
}

impl<T: Write> RequestWriter<T> {
    /// Create a writer bounded by [`MAX_REQUEST_SIZE`].
    pub fn new(inner: T) -> Self {
        Self::with_max_request_size(inner, MAX_REQUEST_SIZE)
    }

    pub fn with_max_request_size(inner: T, max_request_size: usize) -> Self {
        Self {
            inner,
            max_request_size,
        }
    }

    /// Write the whole request (blocking), then flush.
    pub fn send(&mut self, request: &[u8]) -> Result<()> {
        if request.len() > self.max_request_size {
            return Err(ProtocolError::RequestTooLarge {
                size: request.len(),
                max: self.max_request_size,
            });
        }

        let mut offset = 0usize;
        while offset < request.len() {
            match self.inner.write(&request[offset..]) {
                Ok(0) => return Err(ProtocolError::ConnectionClosed { received: offset }),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ProtocolError::Io(err)),
            }
        }
        trace!(size = request.len(), "request written");

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ProtocolError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
