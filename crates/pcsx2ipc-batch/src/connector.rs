use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use pcsx2ipc_transport::IpcStream;

use crate::config::BatchConfig;
use crate::error::Result;

/// Opens the connection that carries one batch.
///
/// A fresh stream is requested for every flush; dropping it closes the
/// connection once the response has been read.
pub trait Connector {
    type Stream: Read + Write;

    fn connect(&mut self) -> Result<Self::Stream>;
}

/// Connects to the emulator's Unix domain socket.
#[derive(Debug, Clone)]
pub struct UdsConnector {
    path: PathBuf,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl UdsConnector {
    pub fn new(
        path: impl Into<PathBuf>,
        read_timeout: Option<Duration>,
        write_timeout: Option<Duration>,
    ) -> Self {
        Self {
            path: path.into(),
            read_timeout,
            write_timeout,
        }
    }

    /// Resolve the socket path and timeouts from a config.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(
            config.resolved_socket_path(),
            config.read_timeout,
            config.write_timeout,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for UdsConnector {
    type Stream = IpcStream;

    fn connect(&mut self) -> Result<IpcStream> {
        let stream = pcsx2ipc_transport::connect_with_timeouts(
            &self.path,
            self.read_timeout,
            self.write_timeout,
        )?;
        Ok(stream)
    }
}
