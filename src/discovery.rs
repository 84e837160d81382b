//! Discovery of target processes and assignment of display names.
//!
//! A poll is two passes: first every candidate under the proc root is read
//! into a raw list, which is then ordered by start time; only then are CPU
//! percentages and names assigned. Ordinal suffixes depend on the position
//! of a process among *all* candidates with the same base name, so the two
//! passes must not be merged.

use ahash::AHashMap as HashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};

use crate::cpu::{CpuCounterPair, CpuEstimator};
use crate::procfs::{ProcReader, ProcSnapshot};
use crate::system;

/// One discovered process, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub working_dir: String,
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub start_time: i64,
}

/// Errors surfaced by a poll.
#[derive(Debug)]
pub enum MonitorError {
    /// The proc root itself could not be listed.
    Enumeration { root: PathBuf, source: std::io::Error },
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Enumeration { root, source } => {
                write!(f, "failed to read {}: {}", root.display(), source)
            }
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Enumeration { source, .. } => Some(source),
        }
    }
}

/// Finds instances of one executable and tracks their CPU counters.
pub struct ProcessMonitor {
    reader: ProcReader,
    target: String,
    estimator: Mutex<CpuEstimator>,
}

impl ProcessMonitor {
    pub fn new(reader: ProcReader, target: impl Into<String>) -> Self {
        let estimator = CpuEstimator::new(reader.clock_ticks());
        Self::with_estimator(reader, target, estimator)
    }

    pub fn with_estimator(
        reader: ProcReader,
        target: impl Into<String>,
        estimator: CpuEstimator,
    ) -> Self {
        Self {
            reader,
            target: target.into(),
            estimator: Mutex::new(estimator),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn reader(&self) -> &ProcReader {
        &self.reader
    }

    /// Number of pids whose counters are carried into the next poll.
    pub fn tracked_pids(&self) -> usize {
        self.estimator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tracked()
    }

    pub fn is_tracking(&self, pid: u32) -> bool {
        self.estimator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_tracking(pid)
    }

    /// Polls the process table now.
    pub fn list_processes(&self) -> Result<Vec<ProcessRecord>, MonitorError> {
        self.list_processes_at(Instant::now(), chrono::Utc::now().timestamp())
    }

    /// Polls the process table as of `now` / `now_epoch`.
    ///
    /// The estimator lock is held for the whole poll, so concurrent callers
    /// are serialised and never interleave their counter updates.
    #[instrument(skip(self), fields(target = %self.target))]
    pub fn list_processes_at(
        &self,
        now: Instant,
        now_epoch: i64,
    ) -> Result<Vec<ProcessRecord>, MonitorError> {
        let mut estimator = self
            .estimator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let pids = enumerate_pids(self.reader.root())?;
        let elapsed = estimator.elapsed_since_last_poll(now);
        let boot_time = system::boot_time_epoch(self.reader.root(), now_epoch);

        // First pass: raw snapshots of confirmed instances.
        let mut raw: Vec<ProcSnapshot> = pids
            .par_iter()
            .map(|&pid| self.reader.read_snapshot(pid, &self.target, boot_time))
            .filter(|snap| snap.matches)
            .collect();

        raw.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.pid.cmp(&b.pid)));

        // Second pass: percentages and names in start-time order.
        let mut current: HashMap<u32, CpuCounterPair> = HashMap::with_capacity(raw.len());
        let mut processes = Vec::with_capacity(raw.len());
        let mut namer = DisplayNamer::new(&self.target);

        for snap in raw {
            let cpu_percent = estimator.estimate(snap.pid, snap.counters, elapsed);
            current.insert(snap.pid, snap.counters);
            processes.push(ProcessRecord {
                pid: snap.pid,
                name: namer.next_name(&snap.working_dir),
                working_dir: snap.working_dir,
                cpu_percent,
                memory_mb: snap.memory_mb,
                start_time: snap.start_time,
            });
        }

        estimator.commit(current, now);

        debug!(
            "Poll found {} of {} candidates (elapsed {:.2}s)",
            processes.len(),
            pids.len(),
            elapsed
        );
        Ok(processes)
    }
}

/// Lists the numeric directory entries of the proc root.
pub fn enumerate_pids(root: &Path) -> Result<Vec<u32>, MonitorError> {
    let entries = fs::read_dir(root).map_err(|source| MonitorError::Enumeration {
        root: root.to_path_buf(),
        source,
    })?;

    let mut pids = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        if let Ok(pid) = name.parse::<u32>() {
            pids.push(pid);
        }
    }
    Ok(pids)
}

/// Base display name: last segment of `working_dir`, or `fallback`.
///
/// Segments are taken literally after dropping trailing slashes, so
/// `/a/..` is named `..`. An empty path or the root falls back.
pub fn base_name<'a>(working_dir: &'a str, fallback: &'a str) -> &'a str {
    match working_dir.trim_end_matches('/').rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => fallback,
    }
}

/// English ordinal used in duplicate suffixes: 2nd, 3rd, then Nth.
pub fn ordinal(n: usize) -> String {
    match n {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{}th", n),
    }
}

/// Assigns names in call order; the Nth use of a base name gets "(Nth)".
pub struct DisplayNamer<'a> {
    fallback: &'a str,
    seen: HashMap<String, usize>,
}

impl<'a> DisplayNamer<'a> {
    pub fn new(fallback: &'a str) -> Self {
        Self {
            fallback,
            seen: HashMap::new(),
        }
    }

    pub fn next_name(&mut self, working_dir: &str) -> String {
        let base = base_name(working_dir, self.fallback).to_string();
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            format!("{} ({})", base, ordinal(*count))
        } else {
            base
        }
    }
}
