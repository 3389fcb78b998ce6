mod cmd;
mod exit;
mod hex;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "pcsx2ipc",
    version,
    about = "Peek and poke PCSX2 emulated memory over IPC"
)]
struct Cli {
    /// Emulator socket path. Default: ${XDG_RUNTIME_DIR:-/tmp}/pcsx2.sock.
    #[arg(long, value_name = "PATH", env = "PCSX2_IPC_SOCKET", global = true)]
    socket: Option<PathBuf>,

    /// Send/receive timeout per round trip (e.g. 10s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "10s", global = true)]
    timeout: String,

    /// Output format.
    #[arg(long, value_name = "FORMAT", default_value = "pretty", global = true)]
    format: OutputFormat,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit 1; --help and --version exit 0.
            let code = if err.use_stderr() {
                exit::FAILURE
            } else {
                exit::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    let result = Context::new(cli.socket, &cli.timeout, cli.format)
        .and_then(|ctx| cmd::run(cli.command, &ctx));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
