use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use pcsx2ipc_batch::{BatchConfig, Client};
use pcsx2ipc_protocol::Width;

use crate::exit::{batch_error, CliError, CliResult};
use crate::hex::{parse_hex_u32, parse_hex_u64, parse_hex_u8};
use crate::output::OutputFormat;

pub mod doctor;
pub mod memset;
pub mod peek;
pub mod poke;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read memory and print it as hex.
    Peek(PeekArgs),
    /// Write a single 8/16/32/64-bit value.
    Poke(PokeArgs),
    /// Fill `size` bytes starting at `address` with `value`.
    Memset(MemsetArgs),
    /// Fill the half-open range [start, end) with `value`.
    MemsetRange(MemsetRangeArgs),
    /// Check that the emulator socket can be reached.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every command.
#[derive(Debug)]
pub struct Context {
    pub config: BatchConfig,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(socket: Option<PathBuf>, timeout: &str, format: OutputFormat) -> CliResult<Self> {
        let timeout = parse_duration(timeout)?;
        let mut config = BatchConfig::default().with_timeout(timeout);
        config.socket_path = socket;
        Ok(Self { config, format })
    }

    /// Build a batch client from the shared settings.
    pub fn client(&self) -> CliResult<Client> {
        Client::new(self.config.clone()).map_err(|err| batch_error("invalid configuration", err))
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Peek(args) => peek::run(args, ctx),
        Command::Poke(args) => poke::run(args, ctx),
        Command::Memset(args) => memset::run(args, ctx),
        Command::MemsetRange(args) => memset::run_range(args, ctx),
        Command::Doctor(args) => doctor::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

/// Access width in bits, as written on the command line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AccessWidth {
    #[default]
    #[value(name = "8")]
    Bits8,
    #[value(name = "16")]
    Bits16,
    #[value(name = "32")]
    Bits32,
    #[value(name = "64")]
    Bits64,
}

impl AccessWidth {
    pub fn width(self) -> Width {
        match self {
            AccessWidth::Bits8 => Width::Byte,
            AccessWidth::Bits16 => Width::Half,
            AccessWidth::Bits32 => Width::Word,
            AccessWidth::Bits64 => Width::Double,
        }
    }
}

#[derive(Args, Debug)]
pub struct PeekArgs {
    /// Address in hex.
    #[arg(value_parser = parse_hex_u32)]
    pub address: u32,
    /// Access width in bits.
    #[arg(long, short = 'w', value_name = "BITS", default_value = "8")]
    pub width: AccessWidth,
    /// Number of consecutive values to read, in hex.
    #[arg(long, short = 'n', value_name = "HEX", default_value = "1", value_parser = parse_hex_u32)]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct PokeArgs {
    /// Address in hex.
    #[arg(value_parser = parse_hex_u32)]
    pub address: u32,
    /// Value in hex; must fit the access width.
    #[arg(value_parser = parse_hex_u64)]
    pub value: u64,
    /// Access width in bits.
    #[arg(long, short = 'w', value_name = "BITS", default_value = "8")]
    pub width: AccessWidth,
}

#[derive(Args, Debug)]
pub struct MemsetArgs {
    /// Address in hex.
    #[arg(value_parser = parse_hex_u32)]
    pub address: u32,
    /// Byte value in hex.
    #[arg(value_parser = parse_hex_u8)]
    pub value: u8,
    /// Number of bytes in hex.
    #[arg(value_parser = parse_hex_u32)]
    pub size: u32,
}

#[derive(Args, Debug)]
pub struct MemsetRangeArgs {
    /// Start address in hex (inclusive).
    #[arg(value_parser = parse_hex_u32)]
    pub start: u32,
    /// End address in hex (exclusive).
    #[arg(value_parser = parse_hex_u32)]
    pub end: u32,
    /// Byte value in hex.
    #[arg(value_parser = parse_hex_u8)]
    pub value: u8,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
