use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{decode_response, Response, MAX_RESPONSE_SIZE};
use crate::error::{ProtocolError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads one complete response from any `Read` stream.
///
/// Handles partial reads internally: the size header may arrive split across
/// reads, and the body may trickle in over any number of reads.
pub struct ResponseReader<T> {
    inner: T,
    buf: BytesMut,
    max_response_size: usize,
}

impl<T: Read> ResponseReader<T> {
    /// Create a reader bounded by [`MAX_RESPONSE_SIZE`].
    pub fn new(inner: T) -> Self {
        Self::with_max_response_size(inner, MAX_RESPONSE_SIZE)
    }

    /// Create a reader with an explicit response size bound.
    pub fn with_max_response_size(inner: T, max_response_size: usize) -> Self {
        Self::with_buffer(
            inner,
            BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_response_size,
        )
    }

    /// Create a reader that receives into a caller-owned buffer.
    ///
    /// The buffer is cleared first; get it back with [`ResponseReader::into_parts`].
    pub fn with_buffer(inner: T, mut buf: BytesMut, max_response_size: usize) -> Self {
        buf.clear();
        Self {
            inner,
            buf,
            max_response_size,
        }
    }

    /// Read the next complete response (blocking).
    ///
    /// Returns `Err(ProtocolError::ConnectionClosed)` if EOF is reached first.
    /// A timeout surfaces as `ProtocolError::Io`.
    pub fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some(response) = decode_response(&mut self.buf, self.max_response_size)? {
                trace!(
                    status = response.status.as_byte(),
                    size = response.wire_size(),
                    "response received"
                );
                return Ok(response);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ProtocolError::Io(err)),
            };

            if read == 0 {
                debug!(received = self.buf.len(), "peer closed before a full response");
                return Err(ProtocolError::ConnectionClosed {
                    received: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the stream and receive buffer.
    pub fn into_parts(self) -> (T, BytesMut) {
        (self.inner, self.buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::codec::{encode_response, Status};

    #[test]
    fn read_single_response() {
        let mut wire = BytesMut::new();
        encode_response(Status::Ok, &[0x7F], &mut wire).unwrap();

        let mut reader = ResponseReader::new(Cursor::new(wire.to_vec()));
        let response = reader.read_response().unwrap();

        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.payload.as_ref(), &[0x7F]);
    }

    #[test]
    fn read_large_response() {
        let payload = vec![0xAB; 64 * 1024];
        let mut wire = BytesMut::new();
        encode_response(Status::Ok, &payload, &mut wire).unwrap();

        let mut reader = ResponseReader::new(Cursor::new(wire.to_vec()));
        let response = reader.read_response().unwrap();

        assert_eq!(response.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let mut wire = BytesMut::new();
        encode_response(Status::Ok, &[1, 2, 3, 4, 5, 6, 7, 8], &mut wire).unwrap();

        let mut reader = ResponseReader::new(ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        });

        let response = reader.read_response().unwrap();
        assert_eq!(response.payload.as_ref(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut wire = BytesMut::new();
        encode_response(Status::Ok, &[9], &mut wire).unwrap();

        let mut reader = ResponseReader::new(InterruptOnce {
            inner: Cursor::new(wire.to_vec()),
            interrupted: false,
        });
        assert_eq!(reader.read_response().unwrap().payload.as_ref(), &[9]);
    }

    #[test]
    fn failure_status_is_returned_not_interpreted() {
        let mut wire = BytesMut::new();
        encode_response(Status::Fail, &[], &mut wire).unwrap();

        let mut reader = ResponseReader::new(Cursor::new(wire.to_vec()));
        assert_eq!(reader.read_response().unwrap().status, Status::Fail);
    }

    #[test]
    fn connection_closed_before_header() {
        let mut reader = ResponseReader::new(Cursor::new(vec![0x10, 0x00]));
        let err = reader.read_response().unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed { received: 2 }));
    }

    #[test]
    fn connection_closed_mid_response() {
        let mut partial = BytesMut::new();
        partial.put_u32_ne(16);
        partial.put_u8(Status::OK_BYTE);
        partial.put_slice(b"part");

        let mut reader = ResponseReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_response().unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed { received: 9 }));
    }

    #[test]
    fn oversized_response_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_u32_ne(1024);

        let mut reader = ResponseReader::with_max_response_size(Cursor::new(wire.to_vec()), 16);
        let err = reader.read_response().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ResponseTooLarge {
                size: 1024,
                max: 16
            }
        ));
    }

    #[test]
    fn timeout_surfaces_as_io_error() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        right
            .set_read_timeout(Some(std::time::Duration::from_millis(20)))
            .unwrap();

        let mut reader = ResponseReader::new(right);
        let err = reader.read_response().unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
        drop(left);
    }

    #[test]
    fn buffer_is_handed_back_for_reuse() {
        let mut wire = BytesMut::new();
        encode_response(Status::Ok, &[1], &mut wire).unwrap();

        let mut stale = BytesMut::with_capacity(64);
        stale.put_slice(b"leftover");
        let mut reader = ResponseReader::with_buffer(Cursor::new(wire.to_vec()), stale, 64);
        reader.read_response().unwrap();

        let (_, buf) = reader.into_parts();
        assert!(buf.is_empty());
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptOnce<R> {
        inner: R,
        interrupted: bool,
    }

    impl<R: Read> Read for InterruptOnce<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
