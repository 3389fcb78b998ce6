use tracing::debug;

use crate::cmd::{Context, MemsetArgs, MemsetRangeArgs};
use crate::exit::{batch_error, CliError, CliResult, SUCCESS};

pub fn run(args: MemsetArgs, ctx: &Context) -> CliResult<i32> {
    fill(ctx, args.address, args.value, args.size, "memset failed")
}

/// Fill the half-open range `[start, end)`.
pub fn run_range(args: MemsetRangeArgs, ctx: &Context) -> CliResult<i32> {
    if args.end < args.start {
        return Err(CliError::usage(format!(
            "end address {:#x} is below start address {:#x}",
            args.end, args.start
        )));
    }
    fill(
        ctx,
        args.start,
        args.value,
        args.end - args.start,
        "memset-range failed",
    )
}

fn fill(ctx: &Context, address: u32, value: u8, size: u32, context: &str) -> CliResult<i32> {
    debug!(address, value, size, "fill");

    let mut client = ctx.client()?;
    let mut batch = client.begin();
    batch
        .fill_bytes(address, value, size)
        .and_then(|()| batch.send())
        .map_err(|err| batch_error(context, err))?;

    let stats = client.stats();
    debug!(
        exchanges = stats.exchanges,
        commands = stats.commands_sent,
        "fill complete"
    );
    Ok(SUCCESS)
}
