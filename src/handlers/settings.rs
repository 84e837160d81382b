//! `/api/settings`: read and replace the alert thresholds.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, instrument};

use cli_proc_monitor::settings::Settings;

use crate::handlers::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
}

#[instrument(skip(state))]
pub async fn get_settings_handler(State(state): State<SharedState>) -> Json<Settings> {
    state.health_stats.record_http_request();
    Json(state.settings.get())
}

#[instrument(skip(state))]
pub async fn update_settings_handler(
    State(state): State<SharedState>,
    Json(settings): Json<Settings>,
) -> Result<Json<UpdateResponse>, ApiError> {
    state.health_stats.record_http_request();

    if !settings.cpu_threshold.is_finite() || !settings.temp_threshold.is_finite() {
        return Err(ApiError::BadRequest("thresholds must be finite".into()));
    }

    state
        .settings
        .update(settings)
        .map_err(|e| ApiError::Internal(format!("failed to save settings: {}", e)))?;
    info!("Settings saved to {}", state.settings.path().display());
    Ok(Json(UpdateResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use crate::handlers::{router, test_support};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_settings_roundtrip_through_api() {
        let proc_dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let path = work.path().join("conf").join("settings.json");
        let state = test_support::state_for(proc_dir.path(), &path, false).await;

        let response = router(state.clone())
            .oneshot(
                Request::post("/api/settings")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"cpuThreshold":50,"tempThreshold":70,"alertsEnabled":false}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(path.exists());

        let response = router(state)
            .oneshot(Request::get("/api/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["cpuThreshold"], 50.0);
        assert_eq!(json["alertsEnabled"], false);
    }

    #[tokio::test]
    async fn test_settings_rejects_malformed_body() {
        let proc_dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let state =
            test_support::state_for(proc_dir.path(), &work.path().join("s.json"), false).await;

        let response = router(state)
            .oneshot(
                Request::post("/api/settings")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"cpuThreshold":"high"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
