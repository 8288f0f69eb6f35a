//! ttt-sender entry point.
//!
//! ```text
//! ttt-sender                    Play on the configured interface
//! ttt-sender --iface <name>     Play on another interface
//! ttt-sender --config <path>    Load a custom config TOML
//! ttt-sender --gen-config       Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ttt_core::{TttConfig, TttError};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ttt-sender", about = "Play tic-tac-toe against a switch over raw Ethernet")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "ttt.toml")]
    config: PathBuf,

    /// Network interface (overrides config).
    #[arg(short, long)]
    iface: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        println!("{}", TttConfig::default().to_toml()?);
        return Ok(());
    }

    let mut config = TttConfig::load(&cli.config);
    if let Some(iface) = cli.iface {
        config.link.interface = iface;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("ttt-sender v{}", env!("CARGO_PKG_VERSION"));
    info!("interface: {}", config.link.interface);
    info!("peer: {}", config.link.peer);
    info!("reply timeout: {} ms", config.initiator.reply_timeout_ms);

    play(&config).await?;
    Ok(())
}

#[cfg(target_os = "linux")]
async fn play(config: &TttConfig) -> Result<(), TttError> {
    use ttt_core::{Initiator, Link, RawLink, SessionState, Transport};
    use ttt_sender::console::ConsoleReporter;
    use ttt_sender::input::LineMoves;

    let link = RawLink::open(&config.link.interface)?;
    info!("local address: {}", link.local_mac());

    let transport = Transport::new(link, config.link.peer, config.link.ether_type);
    let mut initiator = Initiator::new(transport, config.initiator());
    let mut moves = LineMoves::new(tokio::io::stdin(), tokio::io::stdout());
    let mut reporter = ConsoleReporter::new(std::io::stdout());

    let state = initiator
        .run(&mut moves, &mut reporter, SessionState::new())
        .await?;
    info!(rounds = state.round(), replies = state.replies(), "session over");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn play(_config: &TttConfig) -> Result<(), TttError> {
    Err(TttError::ProtocolViolation(
        "raw Ethernet links are only available on Linux",
    ))
}
