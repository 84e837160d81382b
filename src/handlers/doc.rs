//! Documentation endpoint handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the /doc endpoint.
#[instrument(skip(state))]
pub async fn doc_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /doc request");

    state.health_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");
    let cfg = &state.config;
    let doc = format!(
        r#"CLI PROCESS MONITOR - DOCUMENTATION
===================================

VERSION: {version}
TARGET:  {target} (polled every {interval}s, {capacity} samples kept)

HTTP ENDPOINTS
--------------
GET  /api/processes       - Processes found by the latest poll (JSON)
GET  /api/history         - All history samples, oldest first (JSON)
GET  /api/history?last=N  - Newest N history samples (JSON)
GET  /api/temperature     - Sensor readings and the primary temperature (JSON)
POST /api/kill/{{pid}}      - Send SIGTERM to a monitored process
GET  /api/settings        - Alert thresholds (JSON)
POST /api/settings        - Replace alert thresholds (JSON body)
GET  /metrics             - Prometheus metrics endpoint
GET  /health              - Health check with poll statistics (plain text)
GET  /doc                 - This documentation (plain text)

PROCESS NAMES
-------------
Each process is named after the last component of its working directory.
Processes sharing a name are ordered by start time; later ones get an
ordinal suffix: "api", "api (2nd)", "api (3rd)", "api (4th)".

CPU PERCENT
-----------
Share of one core used since the previous poll, clamped to 0-100.
A process seen for the first time reports 0.

AVAILABLE METRICS
-----------------
cli_proc_monitor_cpu_percent{{pid,name}}   - CPU usage per process
cli_proc_monitor_memory_mb{{pid,name}}     - Resident memory per process
cli_proc_monitor_processes_total         - Processes found by the last poll
cli_proc_monitor_temperature_celsius     - Primary temperature
cli_proc_monitor_history_samples         - Samples held in history
cli_proc_monitor_poll_duration_seconds   - Duration of the last poll
cli_proc_monitor_poll_success            - 1 if the last poll succeeded

CLI COMMANDS
------------
cli-proc-monitor                      - Start the monitor
cli-proc-monitor check --all          - Validate system requirements
cli-proc-monitor config -o cfg.yaml   - Generate config file
cli-proc-monitor test                 - Run a few polls and print results
cli-proc-monitor --help               - Show all CLI options

{FOOTER_TEXT}
"#,
        target = cfg.target_name(),
        interval = cfg.sample_interval_secs(),
        capacity = cfg.history_capacity(),
    );

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        doc,
    )
}
