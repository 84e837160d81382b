//! Health check endpoint handler.
//!
//! Returns 503 until a poll has succeeded, then a plain-text table of poll
//! statistics and history usage.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "cli-proc-monitor - see /doc for endpoints";

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    state.health_stats.record_http_request();

    let cache = state.cache.read().await;

    let status = if cache.update_success && cache.last_updated.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let message = if cache.is_updating {
        "OK - Poll running"
    } else if cache.update_success {
        "OK"
    } else if cache.last_updated.is_none() {
        "No successful poll yet"
    } else {
        "Last poll failed"
    };

    let age = cache
        .last_updated
        .map(|t| format!("{:.1}s", t.elapsed().as_secs_f64()))
        .unwrap_or_else(|| "never".into());
    let temperature = cache.temperature;
    drop(cache);

    let table = state.health_stats.render_table();
    let history = render_history(&state, &age, temperature);

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\n{table}\n{history}\n{FOOTER_TEXT}"),
    )
}

fn render_history(state: &SharedState, last_poll_age: &str, temperature: f64) -> String {
    let history = state.sampler.history();
    let mut out = String::new();
    writeln!(out, "HISTORY").ok();
    writeln!(out, "=======").ok();
    writeln!(out).ok();
    writeln!(out, "{:20} | {:>12}", "Target", state.config.target_name()).ok();
    writeln!(
        out,
        "{:20} | {:>12}",
        "Samples",
        format!("{}/{}", history.count(), history.capacity())
    )
    .ok();
    writeln!(
        out,
        "{:20} | {:>12}",
        "Tracked pids",
        state.sampler.monitor().tracked_pids()
    )
    .ok();
    writeln!(out, "{:20} | {:>12}", "Last poll age", last_poll_age).ok();
    writeln!(
        out,
        "{:20} | {:>12}",
        "Temperature",
        format!("{:.1}°C", temperature)
    )
    .ok();
    out
}
