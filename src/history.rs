//! Fixed-capacity history of aggregate samples.
//!
//! Samples live in a pre-allocated slot array addressed by a write cursor
//! and an occupancy count. Once the array is full each insert overwrites the
//! oldest sample; reads splice the two halves back into chronological order.

use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::discovery::ProcessRecord;

/// Length of the retained window.
pub const HISTORY_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Default polling period.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Samples needed to cover [`HISTORY_WINDOW`] at [`SAMPLE_INTERVAL`] (360).
pub const DEFAULT_CAPACITY: usize = (HISTORY_WINDOW.as_secs() / SAMPLE_INTERVAL.as_secs()) as usize;

/// Compact per-process entry stored in a history sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

impl From<&ProcessRecord> for ProcessSnapshot {
    fn from(p: &ProcessRecord) -> Self {
        Self {
            pid: p.pid,
            name: p.name.clone(),
            cpu_percent: p.cpu_percent,
            memory_mb: p.memory_mb,
        }
    }
}

/// One poll's worth of history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySample {
    /// Epoch seconds.
    pub timestamp: i64,
    pub temperature: f64,
    pub processes: Vec<ProcessSnapshot>,
}

struct Ring {
    slots: Vec<Option<HistorySample>>,
    head: usize,
    count: usize,
}

impl Ring {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, sample: HistorySample) {
        let cap = self.capacity();
        self.slots[self.head] = Some(sample);
        self.head = (self.head + 1) % cap;
        if self.count < cap {
            self.count += 1;
        }
    }

    fn chronological(&self) -> Vec<HistorySample> {
        let (tail, head) = if self.count < self.capacity() {
            (&self.slots[..self.count], &self.slots[..0])
        } else {
            (&self.slots[self.head..], &self.slots[..self.head])
        };
        tail.iter().chain(head).flatten().cloned().collect()
    }
}

/// Ring buffer of [`HistorySample`]s behind a read/write lock.
pub struct HistoryBuffer {
    inner: RwLock<Ring>,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Creates a buffer holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: RwLock::new(Ring {
                slots: vec![None; capacity],
                head: 0,
                count: 0,
            }),
        }
    }

    /// Appends a sample, evicting the oldest one when full.
    pub fn add(&self, sample: HistorySample) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }

    /// All samples, oldest first.
    pub fn get_all(&self) -> Vec<HistorySample> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .chronological()
    }

    /// The `n` most recent samples, oldest first.
    pub fn get_last(&self, n: usize) -> Vec<HistorySample> {
        let mut all = self.get_all();
        if all.len() > n {
            all.drain(..all.len() - n);
        }
        all
    }

    /// Forgets all samples; the slot array is kept.
    pub fn clear(&self) {
        let mut ring = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        ring.head = 0;
        ring.count = 0;
    }

    pub fn count(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity()
    }
}
