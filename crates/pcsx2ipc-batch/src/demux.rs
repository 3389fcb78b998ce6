//! Response demultiplexing: route each read value back to its destination.

use pcsx2ipc_protocol::{read_value, Command, Response, Status, Width};

use crate::error::{BatchError, Result};

/// Where the value of one read command lands.
///
/// Borrowed for the lifetime of the batch, so a destination always outlives
/// the request that fills it.
#[derive(Debug)]
pub enum Destination<'a> {
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
}

impl Destination<'_> {
    pub fn width(&self) -> Width {
        match self {
            Destination::U8(_) => Width::Byte,
            Destination::U16(_) => Width::Half,
            Destination::U32(_) => Width::Word,
            Destination::U64(_) => Width::Double,
        }
    }

    /// Store a native-order value of exactly `self.width()` bytes.
    fn store(&mut self, chunk: &[u8]) {
        let value = read_value(chunk, self.width());
        match self {
            Destination::U8(dest) => **dest = value as u8,
            Destination::U16(dest) => **dest = value as u16,
            Destination::U32(dest) => **dest = value as u32,
            Destination::U64(dest) => **dest = value,
        }
    }
}

impl<'a> From<&'a mut u8> for Destination<'a> {
    fn from(dest: &'a mut u8) -> Self {
        Destination::U8(dest)
    }
}

impl<'a> From<&'a mut u16> for Destination<'a> {
    fn from(dest: &'a mut u16) -> Self {
        Destination::U16(dest)
    }
}

impl<'a> From<&'a mut u32> for Destination<'a> {
    fn from(dest: &'a mut u32) -> Self {
        Destination::U32(dest)
    }
}

impl<'a> From<&'a mut u64> for Destination<'a> {
    fn from(dest: &'a mut u64) -> Self {
        Destination::U64(dest)
    }
}

/// Apply a response to the commands that produced it.
///
/// Walks `commands` in encoding order. Writes consume nothing; each read
/// consumes `width` bytes of the payload and stores them in the next entry
/// of `destinations`. The status, payload length, and every read/destination
/// pairing are checked before the first destination is touched, so a
/// rejected response leaves all destinations unchanged.
///
/// Returns the number of destinations written.
pub fn apply_response(
    commands: &[Command],
    destinations: &mut [Destination<'_>],
    response: &Response,
) -> Result<usize> {
    if response.status != Status::Ok {
        return Err(BatchError::RemoteFailure {
            status: response.status.as_byte(),
        });
    }

    let expected: usize = commands.iter().map(Command::response_len).sum();
    if response.payload.len() != expected {
        return Err(BatchError::ProtocolDesync(format!(
            "response carries {} value bytes but the request expects {expected}",
            response.payload.len()
        )));
    }

    let reads = commands.iter().filter_map(|command| match *command {
        Command::Read { width, .. } => Some(width),
        Command::Write { .. } => None,
    });
    let read_count = reads.clone().count();
    if read_count != destinations.len() {
        return Err(BatchError::ProtocolDesync(format!(
            "{read_count} read commands but {} destinations",
            destinations.len()
        )));
    }
    if let Some(index) = reads
        .zip(destinations.iter())
        .position(|(width, dest)| width != dest.width())
    {
        return Err(BatchError::ProtocolDesync(format!(
            "read #{index} width does not match its destination"
        )));
    }

    let payload = response.payload.as_ref();
    let mut cursor = 0usize;
    let mut dests = destinations.iter_mut();
    for command in commands {
        let Command::Read { width, .. } = *command else {
            continue;
        };
        let chunk = &payload[cursor..cursor + width.bytes()];
        if let Some(dest) = dests.next() {
            dest.store(chunk);
        }
        cursor += width.bytes();
    }

    Ok(read_count)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn ok(payload: Vec<u8>) -> Response {
        Response {
            status: Status::Ok,
            payload: Bytes::from(payload),
        }
    }

    #[test]
    fn kth_value_lands_in_kth_destination() {
        let commands = [
            Command::write(Width::Word, 0x100, 1),
            Command::read(Width::Byte, 0x10),
            Command::write(Width::Byte, 0x101, 2),
            Command::write(Width::Double, 0x102, 3),
            Command::read(Width::Half, 0x20),
            Command::read(Width::Double, 0x30),
            Command::write(Width::Half, 0x103, 4),
            Command::read(Width::Word, 0x40),
        ];
        let mut payload = vec![0xAA];
        payload.extend_from_slice(&0xBBCC_u16.to_ne_bytes());
        payload.extend_from_slice(&0x1122_3344_5566_7788_u64.to_ne_bytes());
        payload.extend_from_slice(&0xDEAD_BEEF_u32.to_ne_bytes());

        let (mut a, mut b, mut c, mut d) = (0u8, 0u16, 0u64, 0u32);
        let mut dests = [
            Destination::from(&mut a),
            Destination::from(&mut b),
            Destination::from(&mut c),
            Destination::from(&mut d),
        ];

        let applied = apply_response(&commands, &mut dests, &ok(payload)).unwrap();
        assert_eq!(applied, 4);
        drop(dests);

        assert_eq!(a, 0xAA);
        assert_eq!(b, 0xBBCC);
        assert_eq!(c, 0x1122_3344_5566_7788);
        assert_eq!(d, 0xDEAD_BEEF);
    }

    #[test]
    fn writes_only_consume_no_payload() {
        let commands = [
            Command::write(Width::Byte, 0, 1),
            Command::write(Width::Double, 8, 2),
        ];
        let applied = apply_response(&commands, &mut [], &ok(Vec::new())).unwrap();
        assert_eq!(applied, 0);
    }

    #[test]
    fn failure_status_leaves_destinations_untouched() {
        let commands = [Command::read(Width::Byte, 0)];
        let mut x = 0x55u8;
        let response = Response {
            status: Status::Fail,
            payload: Bytes::from_static(&[0x7F]),
        };

        let err = apply_response(&commands, &mut [Destination::from(&mut x)], &response)
            .unwrap_err();
        assert!(matches!(err, BatchError::RemoteFailure { status: 0xFF }));
        assert_eq!(x, 0x55);
    }

    #[test]
    fn short_payload_is_desync_and_writes_nothing() {
        let commands = [
            Command::read(Width::Byte, 0),
            Command::read(Width::Word, 4),
        ];
        let (mut a, mut b) = (0u8, 0u32);
        let mut dests = [Destination::from(&mut a), Destination::from(&mut b)];

        let err = apply_response(&commands, &mut dests, &ok(vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, BatchError::ProtocolDesync(_)));
        drop(dests);
        assert_eq!((a, b), (0, 0));
    }

    #[test]
    fn trailing_payload_is_desync() {
        let commands = [Command::read(Width::Byte, 0)];
        let mut a = 0u8;
        let err = apply_response(&commands, &mut [Destination::from(&mut a)], &ok(vec![1, 2]))
            .unwrap_err();
        assert!(matches!(err, BatchError::ProtocolDesync(_)));
    }

    #[test]
    fn destination_count_must_match_reads() {
        let commands = [Command::read(Width::Byte, 0), Command::read(Width::Byte, 1)];
        let mut a = 0u8;
        let err = apply_response(&commands, &mut [Destination::from(&mut a)], &ok(vec![1, 2]))
            .unwrap_err();
        assert!(matches!(err, BatchError::ProtocolDesync(_)));
        assert_eq!(a, 0);
    }

    #[test]
    fn destination_width_must_match_read() {
        let commands = [Command::read(Width::Half, 0)];
        let mut a = 0u32;
        let err = apply_response(&commands, &mut [Destination::from(&mut a)], &ok(vec![1, 2]))
            .unwrap_err();
        assert!(matches!(err, BatchError::ProtocolDesync(_)));
        assert_eq!(a, 0);
    }
}
