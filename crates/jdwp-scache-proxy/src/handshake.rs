use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{instrument, trace, warn};

/// Sent by the debugger and echoed by the VM before any packet
pub static JDWP_HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

/// Reads the handshake from `input`, failing if it is anything else
async fn expect_handshake<I>(input: &mut I, side: &str) -> io::Result<()>
where
    I: AsyncRead + Unpin,
{
    let mut buf = [0u8; 14];
    trace!("waiting to read {JDWP_HANDSHAKE:?} from the {side}");
    input.read_exact(&mut buf).await?;
    trace!("read {buf:?} from the {side}");
    if &buf == JDWP_HANDSHAKE {
        Ok(())
    } else {
        warn!("Handshake from the {side} did not match");
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("expected JDWP handshake from the {side}"),
        ))
    }
}

/// Passes the handshake from the debugger to the VM and back, checking it on the way
#[instrument(skip_all, err)]
pub async fn relay_handshake<DI, DO, VI, VO>(
    debugger_input: &mut DI,
    debugger_output: &mut DO,
    vm_input: &mut VI,
    vm_output: &mut VO,
) -> io::Result<()>
where
    DI: AsyncRead + Unpin,
    DO: AsyncWrite + Unpin,
    VI: AsyncRead + Unpin,
    VO: AsyncWrite + Unpin,
{
    expect_handshake(debugger_input, "debugger").await?;
    vm_output.write_all(JDWP_HANDSHAKE).await?;
    vm_output.flush().await?;
    expect_handshake(vm_input, "vm").await?;
    debugger_output.write_all(JDWP_HANDSHAKE).await?;
    debugger_output.flush().await?;
    trace!("Handshake matched");
    Ok(())
}
