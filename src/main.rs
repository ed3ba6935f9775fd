//! Driver Safety Detection server
//!
//! Serves the detection control surface. Detection itself starts when a
//! client posts to `/start_detection`.

use clap::Parser;
use driver_safety::{
    api::{ApiServer, AppState},
    config::FileConfig,
    metrics::MetricsRegistry,
    pipeline::Session,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "driver-safety", version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file.
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("Driver Safety Detection v{}", driver_safety::VERSION);

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    let metrics = match MetricsRegistry::new() {
        Ok(registry) => Some(Arc::new(registry)),
        Err(e) => {
            warn!(error = %e, "Metrics unavailable");
            None
        }
    };

    let mut session = Session::new(&config);
    if let Some(metrics) = &metrics {
        session = session.with_metrics(Arc::clone(metrics));
    }
    let session = Arc::new(session);

    warn!("No face landmark model configured, drowsiness detection is disabled");

    let server = ApiServer::new(
        config.server.bind_addr,
        AppState::new(Arc::clone(&session), metrics),
    );

    // Stopping the session ends open video feeds so the server can drain.
    let shutdown = {
        let session = Arc::clone(&session);
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
            session.stop().await;
        }
    };

    if let Err(e) = server.run(shutdown).await {
        error!(error = %e, "Server failed");
        session.stop().await;
        std::process::exit(1);
    }

    info!("Shutdown complete");
}
