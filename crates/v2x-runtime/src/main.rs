//! # V2X Runtime
//!
//! Entry point of the V2X digital-twin perception pipeline.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs, metrics registry, optional `/metrics`)
//! 2. Load configuration: defaults → settings file → `V2X_*` env → flags
//! 3. Build subsystems, vehicle source and broadcast transport
//! 4. Spawn the metrics handler on the event bus
//! 5. Run the pipeline until the simulation ends, the frame limit or Ctrl-C
//! 6. Save results and exit

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use shared_bus::InMemoryEventBus;
use v2x_runtime::adapters::{build_source, build_transport};
use v2x_runtime::{Cli, MetricsHandler, NodeConfig, RunReport, SubsystemContainer, V2xPipeline};
use v2x_telemetry::{init_telemetry, serve_metrics, TelemetryConfig};

/// Owns the pipeline and its background tasks.
struct V2xRuntime {
    pipeline: V2xPipeline,
    metrics_task: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl V2xRuntime {
    async fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating V2X runtime");

        let bus = Arc::new(InMemoryEventBus::new());
        let subsystems =
            SubsystemContainer::new(&config).context("Failed to initialize subsystems")?;
        let source = build_source(&config.simulation);
        let transport = build_transport(&config.messaging)
            .await
            .context("Failed to set up broadcast transport")?;

        // Subscribe before the first frame is published
        let metrics = MetricsHandler::new(&bus);
        let metrics_task = tokio::spawn(metrics.run());

        let pipeline = V2xPipeline::new(config, subsystems, source, transport, bus);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            pipeline,
            metrics_task,
            shutdown_tx,
            shutdown_rx,
        })
    }

    async fn run(mut self) -> Result<RunReport> {
        let shutdown_tx = self.shutdown_tx.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Pipeline interrupted by user");
                if let Err(e) = shutdown_tx.send(true) {
                    error!("Failed to send shutdown signal: {}", e);
                }
            }
        });

        let result = self.pipeline.run(self.shutdown_rx.clone()).await;
        ctrl_c.abort();

        // The handler exits on SimulationEnded, which cleanup always publishes
        if let Err(e) = self.metrics_task.await {
            warn!(error = %e, "Metrics handler terminated abnormally");
        }
        result.context("Pipeline failed")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = NodeConfig::load(cli.settings.as_deref(), &cli.overrides())
        .context("Invalid configuration")?;

    if telemetry.metrics_enabled() {
        let port = telemetry.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = serve_metrics(port).await {
                error!(port, error = %e, "Metrics endpoint stopped");
            }
        });
    }

    info!("===========================================");
    info!("  V2X SUMO Pipeline v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let runtime = V2xRuntime::new(config).await?;
    let report = runtime.run().await?;

    info!(
        frames = report.frames,
        messages = report.messages,
        reason = %report.end_reason,
        "Run finished"
    );
    Ok(())
}
