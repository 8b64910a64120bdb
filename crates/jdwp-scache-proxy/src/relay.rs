//! Pumps packets between a debugger and a VM through an [SCache]

use crate::handshake::relay_handshake;
use crate::transport::JdwpTransport;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use jdwp_scache::{Batches, Outcome, SCache};
use jdwp_wire::framing::PacketCodec;
use jdwp_wire::packet::Header;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error_span, instrument, trace, Instrument};

type SharedSink<W> = Arc<Mutex<FramedWrite<W, PacketCodec>>>;

/// The direction a pump carries packets in
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    /// Debugger to VM
    Upstream,
    /// VM to debugger
    Downstream,
}

/// Relays one debugger connection to one VM connection until either side hangs up.
///
/// Performs the handshake first, then runs one pump per direction. Both pumps write to both
/// sides: a cache hit is answered towards the debugger, and speculation sends synthetic commands
/// towards the VM.
#[instrument(skip_all)]
pub async fn relay<D, V>(debugger: D, vm: V, scache: Arc<SCache>) -> io::Result<()>
where
    D: JdwpTransport,
    V: JdwpTransport,
{
    let (mut debugger_input, mut debugger_output) = debugger.split_transport();
    let (mut vm_input, mut vm_output) = vm.split_transport();
    relay_handshake(
        &mut debugger_input,
        &mut debugger_output,
        &mut vm_input,
        &mut vm_output,
    )
    .await?;

    let to_debugger = Arc::new(Mutex::new(FramedWrite::new(debugger_output, PacketCodec)));
    let to_vm = Arc::new(Mutex::new(FramedWrite::new(vm_output, PacketCodec)));

    let upstream = pump(
        Direction::Upstream,
        debugger_input,
        scache.clone(),
        to_vm.clone(),
        to_debugger.clone(),
    )
    .instrument(error_span!("upstream"));
    let downstream = pump(
        Direction::Downstream,
        vm_input,
        scache,
        to_vm,
        to_debugger,
    )
    .instrument(error_span!("downstream"));
    tokio::try_join!(upstream, downstream)?;
    debug!("relay finished");
    Ok(())
}

/// Feeds every packet read from `input` through the cache and writes out the edict. When `input`
/// ends, the side it was relaying to is closed.
async fn pump<R, U, W>(
    direction: Direction,
    input: R,
    scache: Arc<SCache>,
    to_vm: SharedSink<U>,
    to_debugger: SharedSink<W>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    U: AsyncWrite + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut input = FramedRead::new(input, PacketCodec);
    while let Some(packet) = input.next().await {
        let packet = packet?;
        let Outcome { edict, journal } = match direction {
            Direction::Upstream => scache.on_upstream_packet(packet),
            Direction::Downstream => scache.on_downstream_packet(packet),
        };
        log_journal(&journal);
        // synthetic commands must reach the VM before the reply that caused them reaches the
        // debugger
        send_all(&to_vm, edict.upstream).await?;
        send_all(&to_debugger, edict.downstream).await?;
    }
    trace!("input closed");
    match direction {
        Direction::Upstream => to_vm.lock().await.close().await,
        Direction::Downstream => to_debugger.lock().await.close().await,
    }
}

async fn send_all<W>(
    sink: &Mutex<FramedWrite<W, PacketCodec>>,
    packets: Vec<Bytes>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if packets.is_empty() {
        return Ok(());
    }
    let mut sink = sink.lock().await;
    for packet in packets {
        sink.feed(packet).await?;
    }
    sink.flush().await
}

fn log_journal(journal: &Batches) {
    for (side, packets) in [("vm", &journal.upstream), ("debugger", &journal.downstream)] {
        for packet in packets {
            match Header::decode(packet) {
                Ok(header) => trace!(
                    to = side,
                    id = header.id(),
                    kind = ?header.kind(),
                    len = header.length(),
                    "journal"
                ),
                Err(_) => trace!(to = side, len = packet.len(), "journal, undecodable"),
            }
        }
    }
}
