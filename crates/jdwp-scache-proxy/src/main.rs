use clap::Parser;
use eyre::WrapErr;
use jdwp_scache::{SCache, SCacheConfig, DEFAULT_MAX_SPECULATED_FRAMES};
use jdwp_scache_proxy::relay;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, Instrument};
use tracing_subscriber::EnvFilter;

/// Speeds up debugging over slow links by answering JDWP metadata requests from a speculative
/// cache
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address the debugger connects to
    #[arg(long, default_value = "127.0.0.1:8700")]
    listen: SocketAddr,
    /// Address of the VM's JDWP agent
    #[arg(long)]
    vm: SocketAddr,
    /// Pass traffic through without caching
    #[arg(long, env = "JDWP_SCACHE_DISABLE")]
    no_cache: bool,
    /// Number of frames of a stack trace to speculate on
    #[arg(long, default_value_t = DEFAULT_MAX_SPECULATED_FRAMES)]
    max_frames: usize,
}

impl Args {
    fn config(&self) -> SCacheConfig {
        SCacheConfig {
            enabled: !self.no_cache,
            max_speculated_frames: self.max_frames,
            ..SCacheConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let listener = TcpListener::bind(args.listen)
        .await
        .wrap_err_with(|| format!("could not listen on {}", args.listen))?;
    info!("waiting for debuggers on {}", args.listen);
    loop {
        let (debugger, peer) = listener.accept().await?;
        let vm = match TcpStream::connect(args.vm).await {
            Ok(vm) => vm,
            Err(err) => {
                error!(%peer, "could not connect to vm at {}: {err}", args.vm);
                continue;
            }
        };
        info!(%peer, "debugger connected");
        let scache = Arc::new(SCache::new(args.config()));
        tokio::spawn(
            async move {
                match relay(debugger, vm, scache).await {
                    Ok(()) => info!("debugger disconnected"),
                    Err(err) => error!("relay failed: {err}"),
                }
            }
            .instrument(tracing::info_span!("connection", %peer)),
        );
    }
}
