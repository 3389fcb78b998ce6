use pcsx2ipc_protocol::{Command, Width, REQUEST_HEADER_SIZE};
use tracing::{debug, warn};

use crate::client::Client;
use crate::connector::Connector;
use crate::demux::{apply_response, Destination};
use crate::error::{BatchError, Result};

/// An open batch of memory accesses.
///
/// Created by [`Client::begin`]. Read destinations are borrowed for `'a` and
/// are filled in by [`Batch::send`] (or by an earlier automatic flush). A
/// batch dropped without being sent is discarded and nothing is transmitted.
pub struct Batch<'c, 'a, C: Connector> {
    client: &'c mut Client<C>,
    commands: Vec<Command>,
    destinations: Vec<Destination<'a>>,
    encoded_len: usize,
    response_len: usize,
}

impl<'c, 'a, C: Connector> Batch<'c, 'a, C> {
    pub(crate) fn new(client: &'c mut Client<C>, commands: Vec<Command>) -> Self {
        Self {
            client,
            commands,
            destinations: Vec::new(),
            encoded_len: REQUEST_HEADER_SIZE,
            response_len: 0,
        }
    }

    /// Queue an 8-bit read into `dest`.
    pub fn read_u8(&mut self, dest: &'a mut u8, address: u32) -> Result<()> {
        self.read(Destination::U8(dest), address)
    }

    /// Queue a 16-bit read into `dest`.
    pub fn read_u16(&mut self, dest: &'a mut u16, address: u32) -> Result<()> {
        self.read(Destination::U16(dest), address)
    }

    /// Queue a 32-bit read into `dest`.
    pub fn read_u32(&mut self, dest: &'a mut u32, address: u32) -> Result<()> {
        self.read(Destination::U32(dest), address)
    }

    /// Queue a 64-bit read into `dest`.
    pub fn read_u64(&mut self, dest: &'a mut u64, address: u32) -> Result<()> {
        self.read(Destination::U64(dest), address)
    }

    pub fn write_u8(&mut self, address: u32, value: u8) -> Result<()> {
        self.write(Width::Byte, address, u64::from(value))
    }

    pub fn write_u16(&mut self, address: u32, value: u16) -> Result<()> {
        self.write(Width::Half, address, u64::from(value))
    }

    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<()> {
        self.write(Width::Word, address, u64::from(value))
    }

    pub fn write_u64(&mut self, address: u32, value: u64) -> Result<()> {
        self.write(Width::Double, address, value)
    }

    /// Queue a read whose width is given by the destination.
    pub fn read(&mut self, dest: Destination<'a>, address: u32) -> Result<()> {
        let command = Command::read(dest.width(), address);
        self.reserve(&command)?;
        self.push(command);
        self.destinations.push(dest);
        Ok(())
    }

    /// Queue a write of the low `width` bytes of `value`.
    pub fn write(&mut self, width: Width, address: u32, value: u64) -> Result<()> {
        let command = Command::write(width, address, value);
        self.reserve(&command)?;
        self.push(command);
        Ok(())
    }

    /// Queue one 8-bit read per byte of `dest`, starting at `address`.
    pub fn read_bytes(&mut self, dest: &'a mut [u8], address: u32) -> Result<()> {
        for (offset, byte) in dest.iter_mut().enumerate() {
            self.read_u8(byte, address.wrapping_add(offset as u32))?;
        }
        Ok(())
    }

    /// Queue one 8-bit write per byte of `src`, starting at `address`.
    pub fn write_bytes(&mut self, address: u32, src: &[u8]) -> Result<()> {
        for (offset, &byte) in src.iter().enumerate() {
            self.write_u8(address.wrapping_add(offset as u32), byte)?;
        }
        Ok(())
    }

    /// Queue `len` 8-bit writes of `value`, starting at `address`.
    pub fn fill_bytes(&mut self, address: u32, value: u8, len: u32) -> Result<()> {
        for offset in 0..len {
            self.write_u8(address.wrapping_add(offset), value)?;
        }
        Ok(())
    }

    /// Send the batch and fill in every read destination.
    ///
    /// An empty batch still opens a connection and sends a header-only
    /// request, so a missing emulator is reported either way.
    pub fn send(mut self) -> Result<()> {
        self.flush()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of queued reads; always equal to the number of destinations.
    pub fn pending_reads(&self) -> usize {
        self.destinations.len()
    }

    /// Size of the request as it would be sent now, header included.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// Size of the response the queued commands will produce, header excluded.
    pub fn expected_response_len(&self) -> usize {
        self.response_len
    }

    /// Flush first if the request is within the margin of its limit, or if
    /// `command` would push the response past it.
    fn reserve(&mut self, command: &Command) -> Result<()> {
        if self.commands.is_empty() {
            return Ok(());
        }
        let config = self.client.config();
        let request_full = self.encoded_len >= config.request_flush_threshold();
        let response_full = command.response_len() > 0
            && self.response_len + command.response_len() > config.response_flush_threshold();
        if !(request_full || response_full) {
            return Ok(());
        }

        debug!(
            commands = self.commands.len(),
            encoded_len = self.encoded_len,
            response_len = self.response_len,
            "batch buffer near capacity, flushing"
        );
        self.client.record_overflow_flush();
        self.flush()
    }

    fn push(&mut self, command: Command) {
        self.encoded_len += command.encoded_len();
        self.response_len += command.response_len();
        self.commands.push(command);
    }

    /// Exchange the queued commands and reset to an empty batch.
    ///
    /// The batch is reset whether or not the exchange succeeded.
    fn flush(&mut self) -> Result<()> {
        let result = self
            .client
            .exchange(&self.commands)
            .and_then(|response| {
                apply_response(&self.commands, &mut self.destinations, &response)
            });
        if let Err(BatchError::RemoteFailure { status }) = &result {
            warn!(
                status = *status,
                commands = self.commands.len(),
                "emulator rejected batch"
            );
        }
        self.reset();
        result.map(|_| ())
    }

    fn reset(&mut self) {
        self.commands.clear();
        self.destinations.clear();
        self.encoded_len = REQUEST_HEADER_SIZE;
        self.response_len = 0;
    }
}

impl<C: Connector> Drop for Batch<'_, '_, C> {
    fn drop(&mut self) {
        if !self.commands.is_empty() {
            debug!(commands = self.commands.len(), "discarding unsent batch");
        }
        let commands = std::mem::take(&mut self.commands);
        self.client.recycle(commands);
    }
}

impl<C: Connector> std::fmt::Debug for Batch<'_, '_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("commands", &self.commands.len())
            .field("pending_reads", &self.destinations.len())
            .field("encoded_len", &self.encoded_len)
            .field("response_len", &self.response_len)
            .finish()
    }
}
