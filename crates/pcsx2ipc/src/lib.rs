//! Batched peek/poke access to PCSX2 emulated memory.
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix domain socket connection to the emulator
//! - [`protocol`]: Request/response wire format
//! - [`batch`]: Command batching, overflow flushing, and response routing
//!
//! The `pcsx2ipc` binary (feature `cli`) wraps the batch client in `peek`,
//! `poke`, `memset`, and `memset-range` commands.

/// Re-export transport types.
pub mod transport {
    pub use pcsx2ipc_transport::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use pcsx2ipc_protocol::*;
}

/// Re-export batch client types.
pub mod batch {
    pub use pcsx2ipc_batch::*;
}

pub use pcsx2ipc_batch::{Batch, BatchConfig, BatchError, Client};
