//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// DHT Monitor - temperature/humidity acquisition with notification and remote sync
#[derive(Parser, Debug)]
#[command(
    name = "dht-monitor",
    author,
    version,
    about = "DHT sensor acquisition monitor",
    long_about = "Reads temperature/humidity records from a serial sensor board.\n\n\
                  Caches the latest reading, persists every reading, announces \n\
                  readings to a throttled notifier and optionally replicates them \n\
                  to a remote endpoint. Falls back to simulated data without a device."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DHT_MONITOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DHT_MONITOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level derived from -q / -v
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acquisition loop
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// List serial ports and mark the auto-detected one
    Ports,

    /// Send a one-shot command to the device
    Device(DeviceArgs),

    /// Probe the remote replicator endpoint
    ReplicatorCheck(ReplicatorCheckArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, default_value = "config.toml", env = "DHT_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Override serial port from configuration (disables auto-detection)
    #[arg(long, env = "SERIAL_PORT")]
    pub port: Option<String>,

    /// Override baud rate from configuration
    #[arg(long, env = "BAUD_RATE")]
    pub baud: Option<u32>,

    /// Skip the device and generate simulated readings
    #[arg(long, env = "SIMULATE_MODE")]
    pub simulate: bool,

    /// Override notification interval in seconds
    #[arg(long, env = "DHT_MONITOR_INTERVAL")]
    pub interval: Option<u64>,

    /// Stop after this many seconds (0 = run until Ctrl+C)
    #[arg(long, default_value = "0", env = "DHT_MONITOR_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DHT_MONITOR_METRICS_PORT")]
    pub metrics_port: u16,
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

/// Arguments for the `device` command
#[derive(Parser, Debug)]
pub struct DeviceArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "DHT_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Override serial port from configuration
    #[arg(long, env = "SERIAL_PORT")]
    pub port: Option<String>,

    #[command(subcommand)]
    pub action: DeviceAction,
}

/// One-shot device actions
#[derive(Subcommand, Debug, Clone)]
pub enum DeviceAction {
    /// Liveness check
    Ping,
    /// Request one reading
    Read,
    /// Sound the buzzer once
    Buzz,
    /// Set the LED colour (0-255 per component)
    SetColor { r: i64, g: i64, b: i64 },
    /// Let the board pick the LED colour from the reading
    AutoColor,
    /// Configure the buzzer
    SetBuzzer { value: u32 },
}

/// Arguments for the `replicator-check` command
#[derive(Parser, Debug)]
pub struct ReplicatorCheckArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "DHT_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Also send a synthetic test reading and wait for the outcome
    #[arg(long)]
    pub push: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
