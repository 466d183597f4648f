//! chronicle demo server.
//!
//! ```text
//! chronicle --config chronicle.toml --bind 127.0.0.1:3000
//! curl localhost:3000/        # one grouped block
//! curl localhost:3000/whoa    # block with a server/error event
//! curl localhost:3000/timeout # TIMEOUT block after correlator.timeout_secs
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use chronicle::config::{load_config, ChronicleConfig};
use chronicle::crash;
use chronicle::http::{demo_router, AppState};
use chronicle::lifecycle::{self, signals, Shutdown};
use chronicle::observability::{logging, metrics};
use chronicle::output::ConsoleWriter;

#[derive(Parser, Debug)]
#[command(name = "chronicle", version, about = "Request-correlated logging demo server")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ChronicleConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("chronicle v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let components = lifecycle::build(&config, Arc::new(ConsoleWriter)).await?;
    crash::install(components.dispatcher.clone());

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::forward_signals(&shutdown);

    let app = demo_router(AppState::new(components.correlator.clone()), &config);
    let stopping = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { stopping.wait().await })
        .await?;

    lifecycle::finish(&components.correlator).await;
    Ok(())
}
