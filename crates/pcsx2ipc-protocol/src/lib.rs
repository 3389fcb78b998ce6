//! Wire format for batched PCSX2 memory read/write requests.
//!
//! A request is a 4-byte size header followed by a run of commands. Each
//! command is a one-byte opcode and a 4-byte address; writes also carry a
//! 1/2/4/8-byte value. The response is a 4-byte size header, a status byte,
//! and the values of every read command, in request order.
//!
//! All integers use the host's native byte order, matching the emulator
//! running on the same machine.

pub mod codec;
pub mod error;
pub mod hexdump;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_value, Command, Opcode,
    Response, Status, Width, COMMAND_HEADER_SIZE, MAX_REQUEST_SIZE, MAX_RESPONSE_SIZE,
    REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE,
};
pub use error::{ProtocolError, Result};
pub use hexdump::hexdump;
pub use reader::ResponseReader;
pub use writer::RequestWriter;
