//! VaxDist CLI and Engine Binary
//!
//! This is the main entry point for the VaxDist allocation engine.
//! It provides commands for initializing, validating, and starting
//! the engine process.

use allocation_engine::{
    AllocationEngine, AllocationEvent, AllocationResult, ExpirySweeper, InMemoryCapacityLedger,
    InMemoryOrderLedger, PassListener,
};
use anyhow::{Context, Result};
use cli::{Cli, Commands};
use config::{generate_default_config, load_config, save_config, validate_config};
use observability::{init_logging, init_metrics, LogFormat};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start { config } => start_engine(config).await,
        Commands::Validate { config } => validate_command(config).await,
        Commands::Init { output } => init_command(output).await,
    }
}

/// Forwards engine events to the global metrics facade so the Prometheus
/// exporter (when enabled) can expose them.
struct TelemetryListener;

#[async_trait::async_trait]
impl PassListener for TelemetryListener {
    async fn on_event(&self, event: &AllocationEvent) -> AllocationResult<()> {
        match event {
            AllocationEvent::PassCompleted {
                orders_fulfilled,
                doses_allocated,
                ..
            } => {
                observability::metrics::record_allocation_pass(
                    orders_fulfilled.len() as u64,
                    *doses_allocated as u64,
                );
            }
            AllocationEvent::OrdersExpired { order_ids } => {
                observability::metrics::record_expiry_sweep(order_ids.len() as u64);
            }
        }
        Ok(())
    }
}

async fn start_engine<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_config(config_path.as_ref())?;

    let format = LogFormat::parse(&config.logging.format).unwrap_or_default();
    init_logging(&config.service.name, format)?;

    let report = validate_config(&config);
    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }
    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start engine due to configuration errors");
    }

    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
    }

    info!(
        service = %config.service.name,
        version = %config.service.version,
        policy = %config.engine.fulfillment_policy,
        "Starting allocation engine"
    );

    let engine = Arc::new(
        AllocationEngine::new(
            Arc::new(InMemoryOrderLedger::new()),
            Arc::new(InMemoryCapacityLedger::new()),
            config.engine.fulfillment_policy,
        )
        .with_listener(Arc::new(TelemetryListener)),
    );

    let sweeper = ExpirySweeper::new(Arc::clone(&engine), config.sweeper.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    info!("Engine running; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");

    shutdown_tx.send(true).ok();
    worker.await.context("Sweeper task panicked")?;

    let snapshot = engine.metrics().snapshot();
    info!(
        passes_run = snapshot.passes_run,
        sweeps_run = snapshot.sweeps_run,
        orders_fulfilled = snapshot.orders_fulfilled,
        orders_expired = snapshot.orders_expired,
        "Engine stopped"
    );

    Ok(())
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    init_logging("vaxdist", LogFormat::Pretty)?;
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {}", config.service.name);
    println!("Version: {}", config.service.version);
    println!("Fulfillment policy: {}", config.engine.fulfillment_policy);
    println!("Sweep interval: {}s", config.sweeper.interval_seconds);

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    init_logging("vaxdist", LogFormat::Pretty)?;
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("This configuration includes:");
    println!("  - Service metadata (name, description, version)");
    println!("  - All-or-nothing fulfillment policy");
    println!("  - 600s expiry sweep interval");
    println!();
    println!("Next steps:");
    println!("  1. Edit the configuration file to customize settings");
    println!(
        "  2. Run 'vaxdist validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'vaxdist start --config {:?}' to start the engine",
        output_path
    );

    Ok(())
}
