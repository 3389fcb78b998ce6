use std::mem;

use bytes::BytesMut;
use pcsx2ipc_protocol::{
    encode_request, hexdump, Command, RequestWriter, Response, ResponseReader,
};
use tracing::{debug, trace, Level};

use crate::batch::Batch;
use crate::config::BatchConfig;
use crate::connector::{Connector, UdsConnector};
use crate::error::{BatchError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Counters describing the traffic a client has produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Request/response round trips completed.
    pub exchanges: u64,
    /// Round trips forced by the overflow guard rather than an explicit send.
    pub overflow_flushes: u64,
    /// Commands carried by completed round trips.
    pub commands_sent: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Owns the connection settings and the buffers reused by every batch.
///
/// A client hands out one [`Batch`] at a time: `begin` borrows the client
/// mutably until the batch is sent or dropped, so batches can never overlap.
pub struct Client<C = UdsConnector> {
    connector: C,
    config: BatchConfig,
    request: BytesMut,
    response: BytesMut,
    commands: Vec<Command>,
    stats: BatchStats,
}

impl Client<UdsConnector> {
    /// Create a client talking to the emulator's Unix domain socket.
    pub fn new(config: BatchConfig) -> Result<Self> {
        let connector = UdsConnector::from_config(&config);
        Self::with_connector(connector, config)
    }
}

impl<C: Connector> Client<C> {
    /// Create a client with a custom connector.
    pub fn with_connector(connector: C, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            connector,
            config,
            request: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            response: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            commands: Vec::new(),
            stats: BatchStats::default(),
        })
    }

    /// Start a new, empty batch.
    pub fn begin<'a>(&mut self) -> Batch<'_, 'a, C> {
        let mut commands = mem::take(&mut self.commands);
        commands.clear();
        Batch::new(self, commands)
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Hand the command list back once a batch is finished with it.
    pub(crate) fn recycle(&mut self, commands: Vec<Command>) {
        self.commands = commands;
    }

    pub(crate) fn record_overflow_flush(&mut self) {
        self.stats.overflow_flushes += 1;
    }

    /// Send one request and receive its response over a fresh connection.
    ///
    /// The connection is closed before returning, whatever the outcome.
    pub(crate) fn exchange(&mut self, commands: &[Command]) -> Result<Response> {
        self.request.clear();
        encode_request(commands, &mut self.request).map_err(BatchError::from_transmit)?;

        if tracing::enabled!(Level::TRACE) {
            trace!(request = %hexdump(&self.request), "command buffer");
        }

        let stream = self.connector.connect()?;
        let mut writer = RequestWriter::with_max_request_size(stream, self.config.max_request_size);
        writer
            .send(&self.request)
            .map_err(BatchError::from_transmit)?;

        let mut reader = ResponseReader::with_buffer(
            writer.into_inner(),
            mem::take(&mut self.response),
            self.config.max_response_size,
        );
        let received = reader.read_response();
        let (stream, buf) = reader.into_parts();
        drop(stream);
        self.response = buf;

        let response = received.map_err(BatchError::from_receive)?;

        self.stats.exchanges += 1;
        self.stats.commands_sent += commands.len() as u64;
        self.stats.bytes_sent += self.request.len() as u64;
        self.stats.bytes_received += response.wire_size() as u64;
        debug!(
            commands = commands.len(),
            request_bytes = self.request.len(),
            response_bytes = response.wire_size(),
            "batch exchanged"
        );

        Ok(response)
    }
}

impl<C> std::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
