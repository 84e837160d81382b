//! `config`: writes a default configuration file.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;

use cli_proc_monitor::config::{render_config, Config};

use crate::cli::ConfigFormat;

pub fn command_config(output: Option<PathBuf>, format: ConfigFormat, commented: bool) -> Result<()> {
    let config = Config::default();
    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("cli-proc-monitor.{}", format.as_str())));

    let mut content = render_config(&config, format.as_str()).map_err(|e| anyhow!("{}", e))?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# CLI Process Monitor Configuration
# ==================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 8080                   # HTTP port
#
# Sampling
# --------
# target_name: "claude"        # Executable name as shown in /proc/<pid>/comm (max 15 bytes)
# sample_interval_secs: 5      # Seconds between polls
# history_capacity: 360        # Samples kept (360 x 5s = 30 minutes)
# proc_root: "/proc"           # Proc filesystem root
# thermal_root: "/sys/class/thermal"
# parallelism: null            # Read threads (null = auto)
#
# Alerts
# ------
# settings_file: null          # Alert thresholds JSON (null = user config dir)
#
# Feature Flags
# -------------
# enable_metrics: true         # Enable /metrics endpoint
# enable_health: true          # Enable /health endpoint
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.yaml");
        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# CLI Process Monitor Configuration"));

        let loaded = cli_proc_monitor::config::load_config(Some(path.as_path())).unwrap();
        assert_eq!(loaded, Config::default());
    }
}
