//! CLI arguments and subcommands for cli-proc-monitor.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "cli-proc-monitor",
    about = "Per-process CPU/memory monitor for a named CLI tool",
    long_about = "Per-process CPU/memory monitor for a named CLI tool.\n\n\
                  Polls /proc for instances of the target executable, names them after \
                  their working directory, and serves the latest poll plus a rolling \
                  30 minute history over HTTP.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Executable name to monitor (matched against /proc/<pid>/comm)
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// Seconds between polls
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Number of samples kept in history
    #[arg(long)]
    pub history_capacity: Option<usize>,

    /// Alternative proc filesystem root
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Alert settings file (JSON)
    #[arg(long)]
    pub settings_file: Option<PathBuf>,

    /// Disable /metrics endpoint
    #[arg(long)]
    pub disable_metrics: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and system requirements
    Check {
        /// Check the proc filesystem
        #[arg(long)]
        proc: bool,

        /// Check thermal zones
        #[arg(long)]
        thermal: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run a few polls and print the discovered processes
    Test {
        /// Number of polls
        #[arg(short = 'n', long, default_value_t = 2)]
        iterations: usize,

        /// Show working directories and start times
        #[arg(long)]
        verbose: bool,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<ConfigFormat>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_args() {
        let args = Args::parse_from([
            "cli-proc-monitor",
            "-p",
            "9000",
            "--target",
            "codex",
            "--interval",
            "10",
            "--bind",
            "127.0.0.1",
        ]);
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.target.as_deref(), Some("codex"));
        assert_eq!(args.interval, Some(10));
        assert!(args.command.is_none());
    }

    #[test]
    fn test_parse_test_subcommand() {
        let args = Args::parse_from(["cli-proc-monitor", "test", "-n", "3", "--format", "json"]);
        match args.command {
            Some(Commands::Test {
                iterations, format, ..
            }) => {
                assert_eq!(iterations, 3);
                assert!(matches!(format, Some(ConfigFormat::Json)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
