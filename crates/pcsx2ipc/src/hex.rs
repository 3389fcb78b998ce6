//! Hexadecimal argument parsing. A leading `0x`/`0X` is optional.

fn parse_hex(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(format!("'{input}' is not a hexadecimal number"));
    }
    u64::from_str_radix(digits, 16).map_err(|err| format!("'{input}' is not valid hex: {err}"))
}

fn parse_hex_bounded(input: &str, max: u64) -> Result<u64, String> {
    let value = parse_hex(input)?;
    if value > max {
        return Err(format!("{value:#x} is larger than {max:#x}"));
    }
    Ok(value)
}

pub fn parse_hex_u8(input: &str) -> Result<u8, String> {
    parse_hex_bounded(input, u64::from(u8::MAX)).map(|v| v as u8)
}

pub fn parse_hex_u32(input: &str) -> Result<u32, String> {
    parse_hex_bounded(input, u64::from(u32::MAX)).map(|v| v as u32)
}

pub fn parse_hex_u64(input: &str) -> Result<u64, String> {
    parse_hex(input)
}
