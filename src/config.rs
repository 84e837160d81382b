//! Configuration file handling.
//!
//! Every field is optional; unset fields fall back to the defaults below.
//! Files are read as YAML, JSON or TOML depending on their extension.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::history::{DEFAULT_CAPACITY, SAMPLE_INTERVAL};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TARGET: &str = "claude";
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_THERMAL_ROOT: &str = "/sys/class/thermal";

/// Longest name the kernel keeps in /proc/<pid>/comm.
pub const MAX_COMM_LEN: usize = 15;

/// Accepted values for `log_level`.
pub const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Locations searched when no config file is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/cli-proc-monitor/config.yaml",
    "/etc/cli-proc-monitor/config.yml",
    "/etc/cli-proc-monitor/config.json",
    "./cli-proc-monitor.yaml",
    "./cli-proc-monitor.yml",
    "./cli-proc-monitor.json",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Sampling
    /// Executable name matched against /proc/<pid>/comm
    #[serde(alias = "target")]
    pub target_name: Option<String>,
    pub proc_root: Option<PathBuf>,
    pub thermal_root: Option<PathBuf>,
    #[serde(alias = "interval")]
    pub sample_interval_secs: Option<u64>,
    pub history_capacity: Option<usize>,
    /// Parallel read threads (0 = auto)
    pub parallelism: Option<usize>,

    // Alert settings file
    pub settings_file: Option<PathBuf>,

    // Feature flags
    pub enable_metrics: Option<bool>,
    pub enable_health: Option<bool>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            target_name: Some(DEFAULT_TARGET.to_string()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            thermal_root: Some(PathBuf::from(DEFAULT_THERMAL_ROOT)),
            sample_interval_secs: Some(SAMPLE_INTERVAL.as_secs()),
            history_capacity: Some(DEFAULT_CAPACITY),
            parallelism: None,
            settings_file: None,
            enable_metrics: Some(true),
            enable_health: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn target_name(&self) -> &str {
        self.target_name.as_deref().unwrap_or(DEFAULT_TARGET)
    }

    pub fn proc_root(&self) -> &Path {
        self.proc_root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROC_ROOT))
    }

    pub fn thermal_root(&self) -> &Path {
        self.thermal_root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_THERMAL_ROOT))
    }

    pub fn sample_interval_secs(&self) -> u64 {
        self.sample_interval_secs
            .unwrap_or_else(|| SAMPLE_INTERVAL.as_secs())
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.settings_file
            .clone()
            .unwrap_or_else(crate::settings::default_settings_path)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let target = cfg.target_name();
    if target.is_empty() {
        return Err("target_name must not be empty".into());
    }
    if target.len() > MAX_COMM_LEN {
        return Err(format!(
            "target_name '{}' is longer than {} bytes and can never match /proc/<pid>/comm",
            target, MAX_COMM_LEN
        )
        .into());
    }

    if cfg.sample_interval_secs() == 0 {
        return Err("sample_interval_secs must be at least 1".into());
    }

    if cfg.history_capacity() == 0 {
        return Err("history_capacity must be at least 1".into());
    }

    if cfg.bind().parse::<IpAddr>().is_err() {
        return Err(format!("Invalid bind address '{}'", cfg.bind()).into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if !LOG_LEVELS.contains(&level) {
            return Err(format!("Invalid log_level '{}'", level).into());
        }
    }

    Ok(())
}

/// Loads a config file, or the first default location that exists.
///
/// Returns defaults when no file is found.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Serialises `config` as yaml, json or toml.
pub fn render_config(config: &Config, format: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        "json" => serde_json::to_string_pretty(config)?,
        "toml" => toml::to_string_pretty(config)?,
        _ => serde_yaml::to_string(config)?,
    })
}
