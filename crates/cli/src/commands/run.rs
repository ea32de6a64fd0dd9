//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::service::{IngestService, ServiceConfig};

/// Execute the `run` command
pub async fn run_sink(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(transport) = args.transport {
        info!(transport = ?transport, "Overriding transport from CLI");
        blueprint.dispatch.transport = Some(transport.into());
    }
    if args.disable_buffering {
        info!("Overriding buffering from CLI: disabled");
        blueprint.dispatch.disable_buffering = true;
    }
    if let Some(ref input) = args.input {
        info!(input = %input.display(), "Overriding event source from CLI");
        blueprint.ingest.source = Some(input.clone());
    }

    info!(
        transport = ?blueprint.dispatch.transport,
        buffering = !blueprint.dispatch.disable_buffering,
        queue_capacity = blueprint.queue.max_size,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build service configuration
    let service_config = ServiceConfig {
        blueprint,
        max_events: if args.max_events == 0 {
            None
        } else {
            Some(args.max_events)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let service = IngestService::new(service_config);

    info!("Starting ingest service...");

    let stats = service
        .run(setup_shutdown_signal())
        .await
        .context("Ingest service failed")?;

    stats.print_summary();

    info!("Telemetry Sink finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::SinkBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Queue:");
    println!("  Capacity: {}", blueprint.queue.max_size);
    println!("  Batch size: {}", blueprint.queue.batch_size);
    println!("  Drain interval: {}ms", blueprint.queue.drain_interval_ms);
    println!("  Max retries: {}", blueprint.queue.max_retries);
    println!("  Overflow policy: {:?}", blueprint.queue.overflow_policy);
    println!(
        "  Throttling: base {}ms, adaptive {}",
        blueprint.queue.base_delay_ms, blueprint.queue.adaptive_throttling
    );
    println!("  Concurrent drains: {}", blueprint.queue.max_concurrent_drains);

    println!("\nDispatch:");
    match blueprint.dispatch.transport {
        Some(kind) => println!("  Transport: {kind}"),
        None => println!("  Transport: (not configured)"),
    }
    println!("  Buffering: {}", !blueprint.dispatch.disable_buffering);
    println!(
        "  Direct send timeout: {}ms",
        blueprint.dispatch.direct_send_timeout_ms
    );
    if !blueprint.dispatch.transport_params.is_empty() {
        println!("  Params:");
        for (key, value) in &blueprint.dispatch.transport_params {
            println!("    {key} = {value}");
        }
    }

    println!("\nIngest:");
    match &blueprint.ingest.source {
        Some(path) => println!("  Source: {}", path.display()),
        None => println!("  Source: stdin"),
    }
    println!("  Channel capacity: {}", blueprint.ingest.channel_capacity);

    println!();
}
