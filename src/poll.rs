//! One scheduled poll: sample, record history, refresh cache and metrics.

use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use cli_proc_monitor::{MonitorError, ProcessRecord};

use crate::state::SharedState;

#[derive(Debug)]
pub enum PollError {
    Monitor(MonitorError),
    /// The blocking poll task panicked or was cancelled.
    Task(tokio::task::JoinError),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Monitor(e) => write!(f, "{}", e),
            PollError::Task(e) => write!(f, "poll task failed: {}", e),
        }
    }
}

impl std::error::Error for PollError {}

/// Records one history sample and publishes it to the cache.
///
/// File reads run on the blocking pool. The previous cache snapshot stays
/// readable until the new one is ready.
#[instrument(skip(state))]
pub async fn update_cache(state: &SharedState) -> Result<usize, PollError> {
    let start = Instant::now();

    state.cache.write().await.is_updating = true;

    let sampler = state.sampler.clone();
    let temperature_source = state.temperature.clone();
    let result = tokio::task::spawn_blocking(move || {
        let temperature = temperature_source.primary();
        sampler
            .record_sample(temperature)
            .map(|processes| (processes, temperature))
    })
    .await;

    let (processes, temperature) = match result {
        Ok(Ok(v)) => v,
        Ok(Err(e)) => {
            mark_failed(state, start).await;
            return Err(PollError::Monitor(e));
        }
        Err(e) => {
            mark_failed(state, start).await;
            return Err(PollError::Task(e));
        }
    };

    let duration = start.elapsed().as_secs_f64();
    let found = processes.len();

    check_alerts(state, &processes, temperature);

    state.metrics.set_processes(&processes);
    state.metrics.temperature.set(temperature);
    state
        .metrics
        .history_samples
        .set(state.sampler.history().count() as f64);
    state.metrics.poll_duration.set(duration);
    state.metrics.poll_success.set(1.0);

    {
        let mut cache = state.cache.write().await;
        cache.processes = processes;
        cache.temperature = temperature;
        cache.last_updated = Some(start);
        cache.update_duration_seconds = duration;
        cache.update_success = true;
        cache.is_updating = false;
    }

    state.health_stats.record_poll(found, duration);

    debug!(
        "Poll completed: {} processes, {:.1}°C, {:.2}ms",
        found,
        temperature,
        duration * 1000.0
    );
    Ok(found)
}

async fn mark_failed(state: &SharedState, start: Instant) {
    let mut cache = state.cache.write().await;
    cache.is_updating = false;
    cache.update_success = false;
    cache.update_duration_seconds = start.elapsed().as_secs_f64();
    state.metrics.poll_success.set(0.0);
    state.health_stats.record_failed_poll();
}

fn check_alerts(state: &SharedState, processes: &[ProcessRecord], temperature: f64) {
    let alerts = state.settings.get().check_alerts(processes, temperature);
    if alerts.cpu_alert {
        warn!(
            "ALERT: High CPU usage on process {}",
            alerts.process.as_deref().unwrap_or("?")
        );
    }
    if alerts.temp_alert {
        warn!("ALERT: High temperature detected ({:.1}°C)", temperature);
    }
    if !alerts.any() && !processes.is_empty() {
        debug!("No alerts for {} processes", processes.len());
    }
}

/// Logs the outcome of a scheduled poll; failures never stop the scheduler.
pub async fn scheduled_poll(state: &SharedState) {
    match update_cache(state).await {
        Ok(found) => debug!("Scheduled poll found {} processes", found),
        Err(e) => warn!("Scheduled poll failed: {}", e),
    }
}

/// Initial poll before the server starts accepting requests.
pub async fn initial_poll(state: &SharedState) {
    info!("Performing initial poll");
    match update_cache(state).await {
        Ok(found) => info!("Initial poll found {} processes", found),
        Err(e) => warn!("Initial poll failed: {}", e),
    }
}
