use clap::Parser;
use sqlbridge::{BridgeConfig, BridgeServices, DriverListener};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sqlbridge")]
#[command(
    about = "Statement bridge - drive SQL connections through opaque handles",
    long_about = None
)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Configuration file (defaults to ./sqlbridge.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default max rows for new connections (0 = unlimited)
    #[arg(long)]
    max_rows: Option<i32>,

    /// Rows per read when the client does not choose
    #[arg(long)]
    chunk_size: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sqlbridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = BridgeConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.bind {
        config.host = host;
    }
    if let Some(max_rows) = args.max_rows {
        config.max_rows = max_rows;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    let services = Arc::new(BridgeServices::with_sqlite(&config));

    let addr = config.bind_addr();
    let listener = DriverListener::bind(&addr, services.clone()).await?;
    tracing::info!("Statement bridge listening on {}", listener.local_addr()?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(listener.serve(shutdown_rx));

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    server.await?;

    let cleanup = services.clone();
    tokio::task::spawn_blocking(move || cleanup.shutdown()).await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, closing open handles...");
}
