//! pumptech Binary Entry Point
//!
//! Loads configuration, builds the hardware source and sink, and runs the
//! collection loop until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use pumptech::{
    BatchSink, CancellationToken, CollectionEngine, InfluxSink, Runner, SimulatedHardware,
    StdoutSink,
    config::{AppConfig, SinkKind, parse_duration},
    logging::init_tracing,
    server::{AppState, create_router},
};

/// pumptech - Pump Station Telemetry Collector
#[derive(Parser, Debug)]
#[command(name = "pumptech", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "PUMPTECH_CONFIG"
    )]
    config: String,

    /// Sink URL (overrides config file)
    #[arg(long, env = "PUMPTECH_SINK_URL")]
    sink_url: Option<String>,

    /// Collection interval, e.g. "500ms" or "2s" (overrides config file)
    #[arg(long, env = "PUMPTECH_INTERVAL", value_parser = parse_duration)]
    interval: Option<Duration>,

    /// Run a single collection cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;

    // CLI > ENV > config file
    if let Some(url) = cli.sink_url {
        config.sink.url = url;
    }
    if let Some(interval) = cli.interval {
        config.collection.interval = Some(interval);
    }
    config.validate()?;

    init_tracing(&config.logging)?;
    tracing::info!(config = %cli.config, "pumptech - Pump Station Telemetry Collector");

    if !config.collection.enabled {
        tracing::warn!("Data collection is disabled in configuration, exiting");
        return Ok(());
    }

    let hardware = SimulatedHardware::new(config.hardware.simulation());
    tracing::info!(mode = %config.hardware.mode, sink = %config.sink.kind, "Hardware source ready");

    match config.sink.kind {
        SinkKind::Influx => {
            tracing::info!(
                url = %config.sink.url,
                org = %config.sink.org,
                bucket = %config.sink.bucket,
                "Using InfluxDB sink"
            );
            let sink = InfluxSink::new(config.sink.influx())?;
            run(&config, cli.once, hardware, sink).await
        }
        SinkKind::Stdout => run(&config, cli.once, hardware, StdoutSink::new()).await,
    }
}

/// Build the engine and drive it until shutdown.
async fn run<S: BatchSink>(
    config: &AppConfig,
    once: bool,
    hardware: SimulatedHardware,
    sink: S,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = CollectionEngine::new(hardware, sink, config.engine_settings());
    let cancel = CancellationToken::new();

    if config.server.enabled {
        let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = create_router(AppState {
            status: engine.subscribe(),
        });
        let server_cancel = cancel.clone();

        tracing::info!("Status server listening on: http://{}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(server_cancel.cancelled_owned())
                .await
            {
                tracing::error!(error = %e, "Status server failed");
            }
        });
    }

    let mut runner = Runner::new(engine, cancel.clone());

    if once {
        let report = runner.run_single_cycle().await;
        cancel.cancel();
        let report = report?;
        tracing::info!(
            points = report.points,
            failed_sources = report.failed_sources.len(),
            "Single collection cycle complete"
        );
        return Ok(());
    }

    tokio::spawn(shutdown_signal(cancel.clone()));

    let interval = config.collection_interval();
    tracing::info!(interval = ?interval, "Press Ctrl+C to shutdown");

    let summary = runner.run_continuous(interval).await;
    cancel.cancel();
    let summary = summary?;

    let stats = runner.engine().stats();
    tracing::info!(
        cycles = summary.cycles,
        failed_cycles = summary.failed_cycles,
        collection_count = stats.collection_count,
        error_count = stats.error_count,
        "Shutdown complete"
    );
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }

    token.cancel();
}
