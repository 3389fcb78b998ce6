use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, Result};

/// Request header: total size (4).
pub const REQUEST_HEADER_SIZE: usize = 4;

/// Response header: total size (4) + status (1).
pub const RESPONSE_HEADER_SIZE: usize = 5;

/// Every command starts with opcode (1) + address (4).
pub const COMMAND_HEADER_SIZE: usize = 5;

/// Largest request the emulator accepts in one exchange.
pub const MAX_REQUEST_SIZE: usize = 650_000;

/// Largest response the emulator produces in one exchange.
pub const MAX_RESPONSE_SIZE: usize = 450_000;

/// Byte width of a single memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Half,
    Word,
    Double,
}

impl Width {
    /// All widths, narrowest first.
    pub const ALL: [Width; 4] = [Width::Byte, Width::Half, Width::Word, Width::Double];

    /// Number of bytes moved by an access of this width.
    pub const fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
            Width::Double => 8,
        }
    }

    /// Width for a byte count, if it is one of 1/2/4/8.
    pub const fn from_bytes(bytes: usize) -> Option<Width> {
        match bytes {
            1 => Some(Width::Byte),
            2 => Some(Width::Half),
            4 => Some(Width::Word),
            8 => Some(Width::Double),
            _ => None,
        }
    }

    /// Mask keeping the low `bytes()` bytes of a value.
    pub const fn mask(self) -> u64 {
        match self {
            Width::Double => u64::MAX,
            other => (1u64 << (other.bytes() * 8)) - 1,
        }
    }
}

/// Opcode byte leading every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Read8 = 0,
    Read16 = 1,
    Read32 = 2,
    Read64 = 3,
    Write8 = 4,
    Write16 = 5,
    Write32 = 6,
    Write64 = 7,
}

impl Opcode {
    /// Parse an opcode byte found at `offset` in a command buffer.
    pub fn from_tag(tag: u8, offset: usize) -> Result<Opcode> {
        Ok(match tag {
            0 => Opcode::Read8,
            1 => Opcode::Read16,
            2 => Opcode::Read32,
            3 => Opcode::Read64,
            4 => Opcode::Write8,
            5 => Opcode::Write16,
            6 => Opcode::Write32,
            7 => Opcode::Write64,
            _ => return Err(ProtocolError::UnknownTag { tag, offset }),
        })
    }

    pub const fn read(width: Width) -> Opcode {
        match width {
            Width::Byte => Opcode::Read8,
            Width::Half => Opcode::Read16,
            Width::Word => Opcode::Read32,
            Width::Double => Opcode::Read64,
        }
    }

    pub const fn write(width: Width) -> Opcode {
        match width {
            Width::Byte => Opcode::Write8,
            Width::Half => Opcode::Write16,
            Width::Word => Opcode::Write32,
            Width::Double => Opcode::Write64,
        }
    }

    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn width(self) -> Width {
        match self {
            Opcode::Read8 | Opcode::Write8 => Width::Byte,
            Opcode::Read16 | Opcode::Write16 => Width::Half,
            Opcode::Read32 | Opcode::Write32 => Width::Word,
            Opcode::Read64 | Opcode::Write64 => Width::Double,
        }
    }

    pub const fn is_read(self) -> bool {
        matches!(
            self,
            Opcode::Read8 | Opcode::Read16 | Opcode::Read32 | Opcode::Read64
        )
    }
}

/// A single memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read `width` bytes at `address`; the value comes back in the response.
    Read { width: Width, address: u32 },
    /// Write the low `width` bytes of `value` to `address`.
    Write {
        width: Width,
        address: u32,
        value: u64,
    },
}

impl Command {
    pub const fn read(width: Width, address: u32) -> Command {
        Command::Read { width, address }
    }

    /// Build a write, dropping any bits above `width`.
    pub const fn write(width: Width, address: u32, value: u64) -> Command {
        Command::Write {
            width,
            address,
            value: value & width.mask(),
        }
    }

    pub const fn opcode(&self) -> Opcode {
        match *self {
            Command::Read { width, .. } => Opcode::read(width),
            Command::Write { width, .. } => Opcode::write(width),
        }
    }

    pub const fn width(&self) -> Width {
        match *self {
            Command::Read { width, .. } | Command::Write { width, .. } => width,
        }
    }

    pub const fn address(&self) -> u32 {
        match *self {
            Command::Read { address, .. } | Command::Write { address, .. } => address,
        }
    }

    /// Bytes this command occupies in a request.
    pub const fn encoded_len(&self) -> usize {
        match *self {
            Command::Read { .. } => COMMAND_HEADER_SIZE,
            Command::Write { width, .. } => COMMAND_HEADER_SIZE + width.bytes(),
        }
    }

    /// Bytes this command contributes to the response payload.
    pub const fn response_len(&self) -> usize {
        match *self {
            Command::Read { width, .. } => width.bytes(),
            Command::Write { .. } => 0,
        }
    }

    /// Append the wire form of this command.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.opcode().tag());
        dst.put_u32_ne(self.address());
        if let Command::Write { width, value, .. } = *self {
            put_value(dst, width, value);
        }
    }
}

/// Status byte of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every command was executed.
    Ok,
    /// The emulator rejected the request as a whole.
    Fail,
    /// A status byte the protocol does not define.
    Other(u8),
}

impl Status {
    pub const OK_BYTE: u8 = 0x00;
    pub const FAIL_BYTE: u8 = 0xFF;

    pub const fn from_byte(byte: u8) -> Status {
        match byte {
            Self::OK_BYTE => Status::Ok,
            Self::FAIL_BYTE => Status::Fail,
            other => Status::Other(other),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            Status::Ok => Self::OK_BYTE,
            Status::Fail => Self::FAIL_BYTE,
            Status::Other(byte) => byte,
        }
    }
}

/// A complete response: status plus the concatenated read values.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub payload: Bytes,
}

impl Response {
    /// The total wire size of this response (header + payload).
    pub fn wire_size(&self) -> usize {
        RESPONSE_HEADER_SIZE + self.payload.len()
    }
}

/// Encode a request into the wire format.
///
/// ```text
/// ┌────────────┬──────────┬────────────┬──────────────────┬─────
/// │ Size (4B)  │ Tag (1B) │ Addr (4B)  │ Value (writes)   │ ...
/// │ total len  │ 0..=7    │            │ 1/2/4/8 bytes    │
/// └────────────┴──────────┴────────────┴──────────────────┴─────
/// ```
pub fn encode_request(commands: &[Command], dst: &mut BytesMut) -> Result<()> {
    let size = REQUEST_HEADER_SIZE + commands.iter().map(Command::encoded_len).sum::<usize>();
    let header = u32::try_from(size).map_err(|_| ProtocolError::RequestTooLarge {
        size,
        max: u32::MAX as usize,
    })?;

    dst.reserve(size);
    dst.put_u32_ne(header);
    for command in commands {
        command.encode(dst);
    }
    Ok(())
}

/// Decode a complete request back into its commands.
///
/// This is what the emulator does on its side of the socket; the client uses
/// it for diagnostics and for local stand-ins of the emulator.
pub fn decode_request(src: &[u8]) -> Result<Vec<Command>> {
    if src.len() < REQUEST_HEADER_SIZE {
        return Err(ProtocolError::Truncated {
            offset: 0,
            needed: REQUEST_HEADER_SIZE,
            available: src.len(),
        });
    }
    let declared = read_u32(&src[..REQUEST_HEADER_SIZE]) as usize;
    if declared != src.len() {
        return Err(ProtocolError::SizeMismatch {
            declared,
            actual: src.len(),
        });
    }

    let mut commands = Vec::new();
    let mut offset = REQUEST_HEADER_SIZE;
    while offset < src.len() {
        let opcode = Opcode::from_tag(src[offset], offset)?;
        let width = opcode.width();
        let needed = if opcode.is_read() {
            COMMAND_HEADER_SIZE
        } else {
            COMMAND_HEADER_SIZE + width.bytes()
        };
        let available = src.len() - offset;
        if available < needed {
            return Err(ProtocolError::Truncated {
                offset,
                needed,
                available,
            });
        }

        let address = read_u32(&src[offset + 1..offset + COMMAND_HEADER_SIZE]);
        let command = if opcode.is_read() {
            Command::read(width, address)
        } else {
            let value_start = offset + COMMAND_HEADER_SIZE;
            Command::write(
                width,
                address,
                read_value(&src[value_start..value_start + width.bytes()], width),
            )
        };
        commands.push(command);
        offset += needed;
    }
    Ok(commands)
}

/// Encode a response into the wire format.
pub fn encode_response(status: Status, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let size = RESPONSE_HEADER_SIZE + payload.len();
    let header = u32::try_from(size).map_err(|_| ProtocolError::ResponseTooLarge {
        size,
        max: u32::MAX as usize,
    })?;
    dst.reserve(size);
    dst.put_u32_ne(header);
    dst.put_u8(status.as_byte());
    dst.put_slice(payload);
    Ok(())
}

/// Decode a response from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete response yet.
/// The size header is validated as soon as its 4 bytes are present, so an
/// oversized response is rejected before its body is read.
pub fn decode_response(src: &mut BytesMut, max_response: usize) -> Result<Option<Response>> {
    if src.len() < REQUEST_HEADER_SIZE {
        return Ok(None);
    }

    let size = read_u32(&src[..REQUEST_HEADER_SIZE]) as usize;
    if size > max_response {
        return Err(ProtocolError::ResponseTooLarge {
            size,
            max: max_response,
        });
    }
    if size < RESPONSE_HEADER_SIZE {
        return Err(ProtocolError::MalformedResponse { size });
    }
    if src.len() < size {
        return Ok(None);
    }

    src.advance(REQUEST_HEADER_SIZE);
    let status = Status::from_byte(src.get_u8());
    let payload = src.split_to(size - RESPONSE_HEADER_SIZE).freeze();

    Ok(Some(Response { status, payload }))
}

/// Read a value of `width` from exactly `width.bytes()` bytes.
pub fn read_value(src: &[u8], width: Width) -> u64 {
    let mut src = &src[..width.bytes()];
    match width {
        Width::Byte => u64::from(src.get_u8()),
        Width::Half => u64::from(src.get_u16_ne()),
        Width::Word => u64::from(src.get_u32_ne()),
        Width::Double => src.get_u64_ne(),
    }
}

fn put_value(dst: &mut BytesMut, width: Width, value: u64) {
    match width {
        Width::Byte => dst.put_u8(value as u8),
        Width::Half => dst.put_u16_ne(value as u16),
        Width::Word => dst.put_u32_ne(value as u32),
        Width::Double => dst.put_u64_ne(value),
    }
}

fn read_u32(mut src: &[u8]) -> u32 {
    src.get_u32_ne()
}
