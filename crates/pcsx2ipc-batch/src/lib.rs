//! Batching client for PCSX2 memory access over IPC.
//!
//! Reads and writes are queued into one command buffer and exchanged with
//! the emulator in a single round trip:
//!
//! ```no_run
//! use pcsx2ipc_batch::{BatchConfig, Client};
//!
//! # fn main() -> pcsx2ipc_batch::Result<()> {
//! let mut client = Client::new(BatchConfig::default())?;
//! let mut health = 0u32;
//! let mut name = [0u8; 16];
//!
//! let mut batch = client.begin();
//! batch.write_u8(0x0020_1000, 0x7F)?;
//! batch.read_u32(&mut health, 0x0020_0000)?;
//! batch.read_bytes(&mut name, 0x0030_0000)?;
//! batch.send()?;
//!
//! println!("health={health:#x}");
//! # Ok(())
//! # }
//! ```
//!
//! A batch that outgrows the request or response limits is flushed
//! transparently in the middle of the append sequence.

pub mod batch;
pub mod client;
pub mod config;
pub mod connector;
pub mod demux;
pub mod error;

pub use batch::Batch;
pub use client::{BatchStats, Client};
pub use config::{BatchConfig, DEFAULT_OVERFLOW_MARGIN, DEFAULT_TIMEOUT, MAX_COMMAND_SIZE};
pub use connector::{Connector, UdsConnector};
pub use demux::{apply_response, Destination};
pub use error::{BatchError, Result};
