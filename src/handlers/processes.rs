//! `/api/processes`: the processes found by the latest poll.

use axum::{extract::State, Json};
use tracing::{debug, instrument};

use cli_proc_monitor::ProcessRecord;

use crate::handlers::ApiError;
use crate::state::SharedState;

/// Serves the cached poll. Only the very first request before any poll has
/// completed reads /proc directly, without recording a history sample.
#[instrument(skip(state))]
pub async fn processes_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProcessRecord>>, ApiError> {
    state.health_stats.record_http_request();

    {
        let cache = state.cache.read().await;
        if cache.last_updated.is_some() {
            debug!("Serving {} cached processes", cache.processes.len());
            return Ok(Json(cache.processes.clone()));
        }
    }

    debug!("No poll yet, listing processes directly");
    let sampler = state.sampler.clone();
    let processes = tokio::task::spawn_blocking(move || sampler.list_processes())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(processes))
}
