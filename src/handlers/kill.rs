//! `/api/kill/{pid}`: sends SIGTERM to one monitored process.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::handlers::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct KillResponse {
    pub success: bool,
    pub pid: u32,
    pub message: String,
}

impl KillResponse {
    pub fn sent(pid: u32) -> Self {
        Self {
            success: true,
            pid,
            message: format!("SIGTERM sent to process {}", pid),
        }
    }
}

/// Only pids present in the latest poll can be signalled.
#[instrument(skip(state))]
pub async fn kill_handler(
    State(state): State<SharedState>,
    Path(pid): Path<String>,
) -> Result<Json<KillResponse>, ApiError> {
    state.health_stats.record_http_request();

    let pid: u32 = pid
        .parse()
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid pid: {}", pid)))?;

    if !state.cache.read().await.contains_pid(pid) {
        return Err(ApiError::NotFound(format!(
            "pid {} is not a monitored {} process",
            pid,
            state.config.target_name()
        )));
    }

    send_sigterm(pid).map_err(|e| {
        warn!("Failed to signal pid {}: {}", pid, e);
        ApiError::Internal(format!("failed to signal pid {}: {}", pid, e))
    })?;

    info!("Sent SIGTERM to pid {}", pid);
    Ok(Json(KillResponse::sent(pid)))
}

fn send_sigterm(pid: u32) -> std::io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::{router, test_support};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn post_kill(uri: &str) -> StatusCode {
        let proc_dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        test_support::write_proc(proc_dir.path(), 40, "claude", work.path());
        let state =
            test_support::state_for(proc_dir.path(), &work.path().join("s.json"), true).await;
        router(state)
            .oneshot(Request::post(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_kill_response_body() {
        let body = serde_json::to_value(super::KillResponse::sent(4242)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": true,
                "pid": 4242,
                "message": "SIGTERM sent to process 4242",
            })
        );
    }

    #[tokio::test]
    async fn test_kill_rejects_invalid_pid() {
        assert_eq!(post_kill("/api/kill/abc").await, StatusCode::BAD_REQUEST);
        assert_eq!(post_kill("/api/kill/0").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_kill_rejects_unmonitored_pid() {
        assert_eq!(post_kill("/api/kill/41").await, StatusCode::NOT_FOUND);
    }
}
