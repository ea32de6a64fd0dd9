//! `info` command implementation.

use anyhow::{Context, Result};

use crate::cli::InfoArgs;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        println!("{}", config_loader::ConfigLoader::to_json(&blueprint)?);
        return Ok(());
    }

    println!("Configuration: {}\n", args.config.display());

    println!("[queue]");
    println!("  max_size = {}", blueprint.queue.max_size);
    println!("  batch_size = {}", blueprint.queue.batch_size);
    println!("  drain_interval_ms = {}", blueprint.queue.drain_interval_ms);
    println!("  max_retries = {}", blueprint.queue.max_retries);
    println!("  overflow_policy = {:?}", blueprint.queue.overflow_policy);
    println!("  base_delay_ms = {}", blueprint.queue.base_delay_ms);
    println!(
        "  adaptive_throttling = {}",
        blueprint.queue.adaptive_throttling
    );
    println!(
        "  max_concurrent_drains = {}",
        blueprint.queue.max_concurrent_drains
    );

    println!("\n[dispatch]");
    match blueprint.dispatch.transport {
        Some(kind) => println!("  transport = {kind}"),
        None => println!("  transport = (not configured)"),
    }
    println!(
        "  disable_buffering = {}",
        blueprint.dispatch.disable_buffering
    );
    println!(
        "  direct_send_timeout_ms = {}",
        blueprint.dispatch.direct_send_timeout_ms
    );
    for (key, value) in &blueprint.dispatch.transport_params {
        println!("  transport_params.{key} = {value}");
    }

    println!("\n[ingest]");
    match &blueprint.ingest.source {
        Some(path) => println!("  source = {}", path.display()),
        None => println!("  source = (stdin)"),
    }
    println!(
        "  channel_capacity = {}",
        blueprint.ingest.channel_capacity
    );

    Ok(())
}
