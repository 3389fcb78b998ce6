use std::fmt::Write;

const ROW_LEN: usize = 16;

/// Render a buffer as rows of 16 hex bytes, each prefixed with its offset.
///
/// ```text
/// 00000000 09 00 00 00 02 00 00 20 00
/// ```
pub fn hexdump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3 + (data.len() / ROW_LEN + 1) * 10);
    for (row, chunk) in data.chunks(ROW_LEN).enumerate() {
        if row > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:08x}", row * ROW_LEN);
        for byte in chunk {
            let _ = write!(out, " {byte:02x}");
        }
    }
    out
}
