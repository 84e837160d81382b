//! User-adjustable alert thresholds, persisted as JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

use crate::discovery::ProcessRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub cpu_threshold: f64,
    pub temp_threshold: f64,
    pub alerts_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cpu_threshold: 90.0,
            temp_threshold: 85.0,
            alerts_enabled: true,
        }
    }
}

/// Outcome of evaluating one poll against the thresholds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertCheck {
    pub cpu_alert: bool,
    pub temp_alert: bool,
    /// Name of the first process at or above the CPU threshold.
    pub process: Option<String>,
}

impl AlertCheck {
    pub fn any(&self) -> bool {
        self.cpu_alert || self.temp_alert
    }
}

impl Settings {
    pub fn check_alerts(&self, processes: &[ProcessRecord], temperature: f64) -> AlertCheck {
        if !self.alerts_enabled {
            return AlertCheck::default();
        }
        let hot = processes
            .iter()
            .find(|p| p.cpu_percent >= self.cpu_threshold);
        AlertCheck {
            cpu_alert: hot.is_some(),
            temp_alert: temperature >= self.temp_threshold,
            process: hot.map(|p| p.name.clone()),
        }
    }
}

/// Default settings file in the platform config directory.
pub fn default_settings_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "cli-proc-monitor")
        .map(|dirs| dirs.config_dir().join("settings.json"))
        .unwrap_or_else(|| PathBuf::from("settings.json"))
}

/// Current settings plus the file they are saved to.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Loads settings from `path`; a missing or invalid file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match read_settings(&path) {
            Ok(Some(s)) => {
                debug!("Loaded settings from {}", path.display());
                s
            }
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("Ignoring settings file {}: {}", path.display(), e);
                Settings::default()
            }
        };
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Settings {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the settings and writes them to disk.
    ///
    /// The in-memory value is updated even if saving fails.
    pub fn update(&self, settings: Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        save_settings(&self.path, &settings)
    }
}

fn read_settings(path: &Path) -> Result<Option<Settings>, Box<dyn std::error::Error + Send + Sync>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn save_settings(path: &Path, settings: &Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}
