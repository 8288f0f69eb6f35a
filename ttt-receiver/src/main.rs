//! ttt-receiver entry point.
//!
//! ```text
//! ttt-receiver                    Watch the configured interface
//! ttt-receiver --iface <name>     Watch another interface
//! ttt-receiver --config <path>    Load a custom config TOML
//! ttt-receiver --gen-config       Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ttt_core::{TttConfig, TttError};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ttt-receiver", about = "Watch a tic-tac-toe game on the wire")]
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

    // --gen-config: dump defaults and exit.
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

    info!("ttt-receiver v{}", env!("CARGO_PKG_VERSION"));
    info!("interface: {}", config.link.interface);
    info!(
        "capture: {} frames / {} ms",
        config.observer.capture_count, config.observer.capture_window_ms
    );

    watch(&config).await?;
    Ok(())
}

#[cfg(target_os = "linux")]
async fn watch(config: &TttConfig) -> Result<(), TttError> {
    use std::sync::atomic::Ordering;

    use ttt_core::{Link, Observer, ObserverState, RawLink};
    use ttt_receiver::console::ConsoleReporter;

    let observer_config = config.observer()?;
    info!("filter: {}", observer_config.filter);
    let link = RawLink::open(&config.link.interface)?;
    info!("local address: {}", link.local_mac());

    let mut observer = Observer::new(link, observer_config);
    let stop = observer.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, stopping after the current poll");
        stop.store(false, Ordering::SeqCst);
    });

    let mut reporter = ConsoleReporter::new(std::io::stdout());
    let state = observer.run(&mut reporter, ObserverState::new()).await?;
    info!(
        polls = state.polls(),
        empty = state.empty_polls(),
        "observer finished"
    );
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn watch(_config: &TttConfig) -> Result<(), TttError> {
    Err(TttError::ProtocolViolation(
        "raw Ethernet links are only available on Linux",
    ))
}
