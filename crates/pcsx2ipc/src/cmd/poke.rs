use tracing::debug;

use crate::cmd::{Context, PokeArgs};
use crate::exit::{batch_error, CliError, CliResult, SUCCESS};

pub fn run(args: PokeArgs, ctx: &Context) -> CliResult<i32> {
    let width = args.width.width();
    if args.value & !width.mask() != 0 {
        return Err(CliError::usage(format!(
            "value {:#x} does not fit in {} bits",
            args.value,
            width.bytes() * 8
        )));
    }
    debug!(
        address = args.address,
        value = args.value,
        width = width.bytes() * 8,
        "poke"
    );

    let mut client = ctx.client()?;
    let mut batch = client.begin();
    batch
        .write(width, args.address, args.value)
        .and_then(|()| batch.send())
        .map_err(|err| batch_error("poke failed", err))?;
    Ok(SUCCESS)
}
