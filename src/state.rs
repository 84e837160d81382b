//! Application state shared by the HTTP handlers and the polling task.

use prometheus::Registry;
use std::sync::Arc;
use tokio::sync::RwLock;

use cli_proc_monitor::config::Config;
use cli_proc_monitor::health_stats::HealthStats;
use cli_proc_monitor::metrics::MonitorMetrics;
use cli_proc_monitor::settings::SettingsStore;
use cli_proc_monitor::temperature::TemperatureSource;
use cli_proc_monitor::Sampler;

use crate::cache::PollCache;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub sampler: Arc<Sampler>,
    pub temperature: Arc<dyn TemperatureSource>,
    pub settings: SettingsStore,
    pub cache: RwLock<PollCache>,
    pub registry: Registry,
    pub metrics: MonitorMetrics,
    pub health_stats: HealthStats,
}

impl AppState {
    /// Builds the state with a fresh registry and empty cache.
    pub fn new(
        config: Config,
        sampler: Arc<Sampler>,
        temperature: Arc<dyn TemperatureSource>,
        settings: SettingsStore,
    ) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let metrics = MonitorMetrics::new(&registry)?;
        Ok(Self {
            config,
            sampler,
            temperature,
            settings,
            cache: RwLock::new(PollCache::default()),
            registry,
            metrics,
            health_stats: HealthStats::new(),
        })
    }
}
