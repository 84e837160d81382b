//! Poll-and-record entry points used by the scheduler and HTTP layer.

use std::time::Instant;
use tracing::debug;

use crate::discovery::{MonitorError, ProcessMonitor, ProcessRecord};
use crate::history::{HistoryBuffer, HistorySample, ProcessSnapshot};

/// Owns the process monitor and the history buffer.
pub struct Sampler {
    monitor: ProcessMonitor,
    history: HistoryBuffer,
}

impl Sampler {
    pub fn new(monitor: ProcessMonitor, history: HistoryBuffer) -> Self {
        Self { monitor, history }
    }

    pub fn monitor(&self) -> &ProcessMonitor {
        &self.monitor
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Runs a poll without recording it.
    pub fn list_processes(&self) -> Result<Vec<ProcessRecord>, MonitorError> {
        self.monitor.list_processes()
    }

    /// Polls, appends a history sample and returns the poll's records.
    ///
    /// Nothing is appended when the process table cannot be enumerated.
    pub fn record_sample(&self, temperature: f64) -> Result<Vec<ProcessRecord>, MonitorError> {
        self.record_sample_at(temperature, Instant::now(), chrono::Utc::now().timestamp())
    }

    pub fn record_sample_at(
        &self,
        temperature: f64,
        now: Instant,
        now_epoch: i64,
    ) -> Result<Vec<ProcessRecord>, MonitorError> {
        let processes = self.monitor.list_processes_at(now, now_epoch)?;
        self.history.add(HistorySample {
            timestamp: now_epoch,
            temperature,
            processes: processes.iter().map(ProcessSnapshot::from).collect(),
        });
        debug!(
            "Recorded sample with {} processes ({} in history)",
            processes.len(),
            self.history.count()
        );
        Ok(processes)
    }

    /// Full history, oldest first.
    pub fn get_history(&self) -> Vec<HistorySample> {
        self.history.get_all()
    }

    pub fn get_last(&self, n: usize) -> Vec<HistorySample> {
        self.history.get_last(n)
    }
}
