//! `/api/history`: samples from the ring buffer, oldest first.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use cli_proc_monitor::HistorySample;

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Return only the newest `last` samples.
    pub last: Option<usize>,
}

#[instrument(skip(state))]
pub async fn history_handler(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<HistorySample>> {
    state.health_stats.record_http_request();

    let samples = match query.last {
        Some(n) => state.sampler.get_last(n),
        None => state.sampler.get_history(),
    };
    debug!("Returning {} history samples", samples.len());
    Json(samples)
}

#[cfg(test)]
mod tests {
    use crate::handlers::{router, test_support};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn fetch(app: axum::Router, uri: &str) -> Vec<serde_json::Value> {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_history_all_and_last() {
        let proc_dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        test_support::write_proc(proc_dir.path(), 30, "claude", work.path());

        let state =
            test_support::state_for(proc_dir.path(), &work.path().join("s.json"), true).await;
        crate::poll::update_cache(&state).await.unwrap();
        crate::poll::update_cache(&state).await.unwrap();

        let all = fetch(router(state.clone()), "/api/history").await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0]["temperature"], 48.0);
        assert_eq!(all[0]["processes"][0]["pid"], 30);

        let last = fetch(router(state), "/api/history?last=2").await;
        assert_eq!(last.len(), 2);
        assert_eq!(last[1]["timestamp"], all[2]["timestamp"]);
    }
}
