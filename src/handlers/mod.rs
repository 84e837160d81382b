//! HTTP endpoint handlers for the monitor.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/api/processes`: latest poll of the target processes
//! - `/api/history`: rolling sample history
//! - `/api/temperature`: current sensor readings
//! - `/api/kill/{pid}`: SIGTERM a monitored process
//! - `/api/settings`: alert thresholds
//! - `/metrics`: Prometheus metrics endpoint
//! - `/health`: Health check endpoint
//! - `/doc`: Documentation endpoint

pub mod doc;
pub mod health;
pub mod history;
pub mod kill;
pub mod metrics;
pub mod processes;
pub mod settings;
pub mod temperature;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::debug;

use crate::state::SharedState;

// Re-export handlers
pub use doc::doc_handler;
pub use health::health_handler;
pub use history::history_handler;
pub use kill::kill_handler;
pub use metrics::metrics_handler;
pub use processes::processes_handler;
pub use settings::{get_settings_handler, update_settings_handler};
pub use temperature::temperature_handler;

/// Error returned by the JSON API handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Builds the router; `/metrics` and `/health` follow the feature flags.
pub fn router(state: SharedState) -> Router {
    let mut app = Router::new()
        .route("/api/processes", get(processes_handler))
        .route("/api/history", get(history_handler))
        .route("/api/temperature", get(temperature_handler))
        .route("/api/kill/{pid}", post(kill_handler))
        .route(
            "/api/settings",
            get(get_settings_handler).post(update_settings_handler),
        )
        .route("/doc", get(doc_handler));

    if state.config.enable_metrics.unwrap_or(true) {
        app = app.route("/metrics", get(metrics_handler));
    } else {
        debug!("/metrics endpoint disabled");
    }

    if state.config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    } else {
        debug!("/health endpoint disabled");
    }

    app.with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use cli_proc_monitor::config::Config;
    use cli_proc_monitor::settings::SettingsStore;
    use cli_proc_monitor::temperature::{TemperatureReading, TemperatureSource};
    use cli_proc_monitor::{HistoryBuffer, ProcReader, ProcessMonitor, Sampler};

    use crate::state::{AppState, SharedState};

    pub struct FixedTemperature(pub Vec<TemperatureReading>);

    impl TemperatureSource for FixedTemperature {
        fn readings(&self) -> Vec<TemperatureReading> {
            self.0.clone()
        }
    }

    /// Writes a fake `/proc/<pid>` entry for the `claude` target.
    pub fn write_proc(root: &Path, pid: u32, comm: &str, cwd: &Path) {
        let dir = root.join(pid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
        std::fs::write(
            dir.join("stat"),
            format!("{pid} ({comm}) S 1 1 1 0 -1 4194560 100 0 0 0 300 200 0 0 20 0 1 0 {} 0 0\n", 1000 + pid),
        )
        .unwrap();
        std::fs::write(dir.join("statm"), "5000 2560 100 10 0 300 0\n").unwrap();
        std::os::unix::fs::symlink(cwd, dir.join("cwd")).unwrap();
    }

    /// State over a fake proc tree, with an optional pre-filled cache.
    pub async fn state_for(root: &Path, settings_path: &Path, poll: bool) -> SharedState {
        std::fs::write(root.join("uptime"), "1000.00 2000.00\n").unwrap();
        let config = Config {
            proc_root: Some(root.to_path_buf()),
            ..Config::default()
        };
        let reader = ProcReader::new(root).with_clock_ticks(100).with_page_size(4096);
        let monitor = ProcessMonitor::new(reader, "claude");
        let sampler = Arc::new(Sampler::new(monitor, HistoryBuffer::new(10)));
        let temperature = Arc::new(FixedTemperature(vec![TemperatureReading {
            label: "Package id 0".into(),
            current: 48.0,
        }]));
        let settings = SettingsStore::load(settings_path);
        let state = Arc::new(AppState::new(config, sampler, temperature, settings).unwrap());
        if poll {
            crate::poll::update_cache(&state).await.unwrap();
        }
        state
    }
}
