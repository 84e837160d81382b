//! `/api/temperature`: every sensor reading plus the primary one.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{debug, instrument};

use cli_proc_monitor::temperature::{select_primary, TemperatureReading};

use crate::handlers::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureResponse {
    pub temperatures: Vec<TemperatureReading>,
    pub main_temp: f64,
}

#[instrument(skip(state))]
pub async fn temperature_handler(
    State(state): State<SharedState>,
) -> Result<Json<TemperatureResponse>, ApiError> {
    state.health_stats.record_http_request();

    let source = state.temperature.clone();
    let temperatures = tokio::task::spawn_blocking(move || source.readings())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let main_temp = select_primary(&temperatures);
    debug!("{} sensors, primary {:.1}°C", temperatures.len(), main_temp);

    Ok(Json(TemperatureResponse {
        temperatures,
        main_temp,
    }))
}
