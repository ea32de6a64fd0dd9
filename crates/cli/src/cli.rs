//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::TransportKind;
use std::path::PathBuf;

/// Telemetry Sink - Player telemetry event ingestion sink
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-sink",
    author,
    version,
    about = "Player telemetry event ingestion sink",
    long_about = "Accepts validated player telemetry events, buffers them in a bounded\n\
                  in-memory queue, and drains them to a configured downstream transport\n\
                  with adaptive pacing, bounded concurrency, and retry-with-give-up."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_SINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_SINK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion sink
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "TELEMETRY_SINK_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the NDJSON event source from configuration
    #[arg(long, env = "TELEMETRY_SINK_INPUT")]
    pub input: Option<PathBuf>,

    /// Override the downstream transport from configuration
    #[arg(long, value_enum, env = "QUEUE_TYPE")]
    pub transport: Option<TransportArg>,

    /// Disable the memory queue and send every event directly
    #[arg(long, env = "DISABLE_MEMORY_QUEUE")]
    pub disable_buffering: bool,

    /// Maximum number of events to ingest (0 = unlimited)
    #[arg(long, default_value = "0", env = "TELEMETRY_SINK_MAX_EVENTS")]
    pub max_events: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TELEMETRY_SINK_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "TELEMETRY_SINK_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Transport selector accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TransportArg {
    /// Log events via tracing
    Log,
    /// Append events as NDJSON to a file
    File,
    /// Forward events over UDP
    Network,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Log => TransportKind::Log,
            TransportArg::File => TransportKind::File,
            TransportArg::Network => TransportKind::Network,
        }
    }
}
