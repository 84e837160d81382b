//! Latest poll result shared with the HTTP handlers.
//!
//! The scheduler replaces the snapshot after every poll; handlers read it
//! without triggering a poll of their own, so requests never disturb the
//! CPU estimator's poll-to-poll deltas.

use std::time::Instant;

use cli_proc_monitor::ProcessRecord;

/// Cache state for the last poll with update timing information.
#[derive(Clone, Default)]
pub struct PollCache {
    pub processes: Vec<ProcessRecord>,
    pub temperature: f64,
    pub last_updated: Option<Instant>,
    pub update_duration_seconds: f64,
    pub update_success: bool,
    pub is_updating: bool,
}

impl PollCache {
    pub fn contains_pid(&self, pid: u32) -> bool {
        self.processes.iter().any(|p| p.pid == pid)
    }
}
