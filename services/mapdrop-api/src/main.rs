//! Mapdrop API service.
//!
//! HTTP server for raster metadata and XYZ tiles.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mapdrop_api::{router, AppState, Args};

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build tokio runtime with configurable worker threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    } else if let Ok(threads_str) = env::var("TOKIO_WORKER_THREADS") {
        if let Ok(threads) = threads_str.parse::<usize>() {
            runtime_builder.worker_threads(threads);
        }
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))?;
    Ok(())
}

async fn async_main(args: Args) -> Result<()> {
    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()?;

    info!(
        data_dir = %args.data_dir.display(),
        fingerprint_keys = args.fingerprint_keys,
        "Starting mapdrop API server"
    );

    let state = Arc::new(AppState::from_args(&args).await?);
    let app = router(state, prometheus_handle);

    // Parse listen address
    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
