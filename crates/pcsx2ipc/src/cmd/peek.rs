use pcsx2ipc_batch::{BatchError, Client, Destination};
use pcsx2ipc_protocol::Width;
use tracing::debug;

use crate::cmd::{Context, PeekArgs};
use crate::exit::{batch_error, CliError, CliResult, SUCCESS};
use crate::output::{print_readout, Readout};

/// Largest number of bytes a single peek may cover.
const MAX_PEEK_SPAN: u64 = 0x10_0000;

pub fn run(args: PeekArgs, ctx: &Context) -> CliResult<i32> {
    let width = args.width.width();
    check_span(args.count, width)?;
    let count = args.count as usize;
    debug!(
        address = args.address,
        width = width.bytes() * 8,
        count,
        "peek"
    );

    let mut client = ctx.client()?;
    let values = match width {
        Width::Byte => {
            let mut buf = vec![0u8; count];
            let mut batch = client.begin();
            batch
                .read_bytes(&mut buf, args.address)
                .and_then(|()| batch.send())
                .map_err(|err| batch_error("peek failed", err))?;
            buf.into_iter().map(u64::from).collect()
        }
        Width::Half => read_values(&mut client, vec![0u16; count], args.address)?,
        Width::Word => read_values(&mut client, vec![0u32; count], args.address)?,
        Width::Double => read_values(&mut client, vec![0u64; count], args.address)?,
    };

    print_readout(
        &Readout {
            address: args.address,
            width,
            values,
        },
        ctx.format,
    );
    Ok(SUCCESS)
}

fn check_span(count: u32, width: Width) -> CliResult<()> {
    if count == 0 {
        return Err(CliError::usage("count must be greater than zero"));
    }
    let span = u64::from(count) * width.bytes() as u64;
    if span > MAX_PEEK_SPAN {
        return Err(CliError::usage(format!(
            "peek of {span:#x} bytes exceeds the {MAX_PEEK_SPAN:#x}-byte limit"
        )));
    }
    Ok(())
}

/// Read `values.len()` consecutive values of `T`'s width in one batch.
fn read_values<T>(client: &mut Client, mut values: Vec<T>, address: u32) -> CliResult<Vec<u64>>
where
    T: Copy + Into<u64>,
    for<'a> &'a mut T: Into<Destination<'a>>,
{
    queue_reads(client, &mut values, address).map_err(|err| batch_error("peek failed", err))?;
    Ok(values.into_iter().map(Into::into).collect())
}

fn queue_reads<'a, T>(client: &mut Client, values: &'a mut [T], address: u32) -> Result<(), BatchError>
where
    &'a mut T: Into<Destination<'a>>,
{
    let mut batch = client.begin();
    let mut next = address;
    for slot in values {
        let dest: Destination<'a> = slot.into();
        let step = dest.width().bytes() as u32;
        batch.read(dest, next)?;
        next = next.wrapping_add(step);
    }
    batch.send()
}
