//! Temperature readings from the sysfs thermal zones.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Labels preferred for the primary reading, in priority order.
pub const PRIMARY_LABELS: &[&str] = &["Tctl", "Tdie", "Package", "Core 0", "CPU", "temp1"];

/// A single sensor reading in degrees Celsius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReading {
    pub label: String,
    pub current: f64,
}

/// Supplies the temperature attached to each history sample.
pub trait TemperatureSource: Send + Sync {
    fn readings(&self) -> Vec<TemperatureReading>;

    /// Primary reading, 0 when no sensor is available.
    fn primary(&self) -> f64 {
        select_primary(&self.readings())
    }
}

/// Picks the first reading whose label contains a [`PRIMARY_LABELS`] entry
/// (earlier entries win), else the first reading, else 0.
pub fn select_primary(readings: &[TemperatureReading]) -> f64 {
    PRIMARY_LABELS
        .iter()
        .find_map(|prio| readings.iter().find(|t| t.label.contains(prio)))
        .or_else(|| readings.first())
        .map(|t| t.current)
        .unwrap_or(0.0)
}

/// Reads `thermal_zone*/temp` (millidegrees) under a thermal class root.
#[derive(Debug, Clone)]
pub struct SysfsThermal {
    root: PathBuf,
}

impl SysfsThermal {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_zone(zone: &Path) -> Option<TemperatureReading> {
        let raw = fs::read_to_string(zone.join("temp")).ok()?;
        let millis: f64 = raw.trim().parse().ok()?;
        let label = fs::read_to_string(zone.join("type"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let label = if label.is_empty() {
            zone.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            label
        };
        Some(TemperatureReading {
            label,
            current: millis / 1000.0,
        })
    }
}

impl Default for SysfsThermal {
    fn default() -> Self {
        Self::new("/sys/class/thermal")
    }
}

impl TemperatureSource for SysfsThermal {
    fn readings(&self) -> Vec<TemperatureReading> {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) => {
                debug!("No thermal zones under {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut zones: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("thermal_zone"))
            })
            .collect();
        zones.sort();

        zones.iter().filter_map(|z| Self::read_zone(z)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reading(label: &str, current: f64) -> TemperatureReading {
        TemperatureReading {
            label: label.into(),
            current,
        }
    }

    fn zone(root: &Path, idx: u32, kind: &str, millis: &str) {
        let dir = root.join(format!("thermal_zone{}", idx));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("temp"), millis).unwrap();
        fs::write(dir.join("type"), kind).unwrap();
    }

    #[test]
    fn test_primary_priority() {
        let temps = vec![
            reading("acpitz", 30.0),
            reading("Core 0", 55.0),
            reading("Package id 0", 61.0),
        ];
        assert_eq!(select_primary(&temps), 61.0);
    }

    #[test]
    fn test_primary_falls_back_to_first() {
        let temps = vec![reading("acpitz", 30.0), reading("nvme", 41.0)];
        assert_eq!(select_primary(&temps), 30.0);
        assert_eq!(select_primary(&[]), 0.0);
    }

    #[test]
    fn test_sysfs_zones() {
        let dir = TempDir::new().unwrap();
        zone(dir.path(), 0, "acpitz\n", "27800\n");
        zone(dir.path(), 1, "x86_pkg_temp\n", "48000\n");
        zone(dir.path(), 2, "broken\n", "n/a\n");
        fs::create_dir_all(dir.path().join("cooling_device0")).unwrap();

        let source = SysfsThermal::new(dir.path());
        let temps = source.readings();
        assert_eq!(temps.len(), 2);
        assert_eq!(temps[0], reading("acpitz", 27.8));
        assert_eq!(temps[1].label, "x86_pkg_temp");
        assert_eq!(source.primary(), 27.8);
    }

    #[test]
    fn test_zone_without_type_uses_directory_name() {
        let dir = TempDir::new().unwrap();
        let zone_dir = dir.path().join("thermal_zone3");
        fs::create_dir_all(&zone_dir).unwrap();
        fs::write(zone_dir.join("temp"), "50000").unwrap();

        let temps = SysfsThermal::new(dir.path()).readings();
        assert_eq!(temps, vec![reading("thermal_zone3", 50.0)]);
    }

    #[test]
    fn test_missing_root_has_no_readings() {
        let source = SysfsThermal::new("/nonexistent/thermal");
        assert!(source.readings().is_empty());
        assert_eq!(source.primary(), 0.0);
    }
}
