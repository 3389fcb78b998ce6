use std::io::Write;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pcsx2ipc_protocol::Width;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

/// Values read from consecutive addresses.
#[derive(Debug)]
pub struct Readout {
    pub address: u32,
    pub width: Width,
    pub values: Vec<u64>,
}

impl Readout {
    fn address_of(&self, index: usize) -> u32 {
        self.address
            .wrapping_add((index * self.width.bytes()) as u32)
    }

    fn hex(&self, value: u64) -> String {
        format!("{value:0digits$x}", digits = self.width.bytes() * 2)
    }
}

#[derive(Serialize)]
struct ReadoutOutput {
    address: String,
    width_bits: usize,
    values: Vec<String>,
}

pub fn print_readout(readout: &Readout, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReadoutOutput {
                address: format!("{:#010x}", readout.address),
                width_bits: readout.width.bytes() * 8,
                values: readout.values.iter().map(|v| readout.hex(*v)).collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "VALUE"]);
            for (index, value) in readout.values.iter().enumerate() {
                table.add_row(vec![
                    format!("{:08x}", readout.address_of(index)),
                    readout.hex(*value),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for line in pretty_lines(readout) {
                println!("{line}");
            }
        }
        OutputFormat::Raw => {
            let mut bytes = Vec::with_capacity(readout.values.len() * readout.width.bytes());
            for value in &readout.values {
                bytes.extend_from_slice(&value.to_le_bytes()[..readout.width.bytes()]);
            }
            print_raw(&bytes);
        }
    }
}

/// A single value prints bare (`7f`); longer readouts print 16 bytes per
/// line behind the address of the first value on that line.
fn pretty_lines(readout: &Readout) -> Vec<String> {
    if readout.values.len() == 1 {
        return vec![readout.hex(readout.values[0])];
    }

    let per_line = (16 / readout.width.bytes()).max(1);
    readout
        .values
        .chunks(per_line)
        .enumerate()
        .map(|(row, chunk)| {
            let values: Vec<String> = chunk.iter().map(|v| readout.hex(*v)).collect();
            format!(
                "{:08x}: {}",
                readout.address_of(row * per_line),
                values.join(" ")
            )
        })
        .collect()
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_prints_two_hex_digits() {
        let readout = Readout {
            address: 0x1000,
            width: Width::Byte,
            values: vec![0x7],
        };
        assert_eq!(pretty_lines(&readout), vec!["07".to_string()]);
    }

    #[test]
    fn wide_values_are_zero_padded() {
        let readout = Readout {
            address: 0x1000,
            width: Width::Word,
            values: vec![0xBEEF],
        };
        assert_eq!(pretty_lines(&readout), vec!["0000beef".to_string()]);
    }

    #[test]
    fn long_readouts_wrap_with_addresses() {
        let readout = Readout {
            address: 0x2000,
            width: Width::Half,
            values: (0..10).collect(),
        };
        assert_eq!(
            pretty_lines(&readout),
            vec![
                "00002000: 0000 0001 0002 0003 0004 0005 0006 0007".to_string(),
                "00002010: 0008 0009".to_string(),
            ]
        );
    }
}
