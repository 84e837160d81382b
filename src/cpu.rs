//! Delta-based CPU percentage estimation.
//!
//! The estimator remembers the (utime, stime) counters of every process seen
//! in the previous poll together with the time of that poll. Percentages are
//! derived from the tick delta between two consecutive observations of the
//! same pid.

use ahash::AHashMap as HashMap;
use std::time::Instant;

/// Lower bound for the wall-clock gap between polls, in seconds.
pub const MIN_ELAPSED_SECS: f64 = 0.1;

/// Accumulated user and kernel CPU time for one process, in clock ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounterPair {
    pub user: u64,
    pub system: u64,
}

impl CpuCounterPair {
    pub fn new(user: u64, system: u64) -> Self {
        Self { user, system }
    }

    /// Combined user + system ticks.
    pub fn total(&self) -> u64 {
        self.user.saturating_add(self.system)
    }
}

/// Per-pid counters of the previous poll plus its timestamp.
pub struct CpuEstimator {
    previous: HashMap<u32, CpuCounterPair>,
    last_poll: Instant,
    ticks_per_second: f64,
}

impl CpuEstimator {
    /// Creates an estimator whose "previous poll" is the moment of creation.
    pub fn new(ticks_per_second: u64) -> Self {
        Self::starting_at(ticks_per_second, Instant::now())
    }

    /// Creates an estimator with an explicit initial poll timestamp.
    pub fn starting_at(ticks_per_second: u64, started: Instant) -> Self {
        Self {
            previous: HashMap::new(),
            last_poll: started,
            ticks_per_second: ticks_per_second.max(1) as f64,
        }
    }

    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    /// Seconds since the previous poll, floored to [`MIN_ELAPSED_SECS`].
    pub fn elapsed_since_last_poll(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.last_poll)
            .as_secs_f64()
            .max(MIN_ELAPSED_SECS)
    }

    /// CPU percentage of `pid` over `elapsed_secs`, clamped to [0, 100].
    ///
    /// Returns 0 for a pid that was not observed in the previous poll.
    pub fn estimate(&self, pid: u32, current: CpuCounterPair, elapsed_secs: f64) -> f64 {
        let Some(prev) = self.previous.get(&pid) else {
            return 0.0;
        };

        // Signed so that a wrapped or inconsistent counter clamps to 0
        // instead of underflowing.
        let delta_ticks = (current.user as i128 - prev.user as i128)
            + (current.system as i128 - prev.system as i128);

        let elapsed = if elapsed_secs.is_finite() {
            elapsed_secs.max(MIN_ELAPSED_SECS)
        } else {
            MIN_ELAPSED_SECS
        };

        let percent = (delta_ticks as f64 / self.ticks_per_second / elapsed) * 100.0;
        percent.clamp(0.0, 100.0)
    }

    /// Replaces the remembered counters with those of the poll just taken.
    ///
    /// Pids absent from `current` are dropped; the next poll's deltas are
    /// computed against exactly this observation.
    pub fn commit(&mut self, current: HashMap<u32, CpuCounterPair>, polled_at: Instant) {
        self.previous = current;
        self.last_poll = polled_at;
    }

    /// Number of pids carried into the next poll.
    pub fn tracked(&self) -> usize {
        self.previous.len()
    }

    pub fn is_tracking(&self, pid: u32) -> bool {
        self.previous.contains_key(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn committed(pairs: &[(u32, u64, u64)]) -> CpuEstimator {
        let start = Instant::now();
        let mut est = CpuEstimator::starting_at(100, start);
        let map = pairs
            .iter()
            .map(|&(pid, u, s)| (pid, CpuCounterPair::new(u, s)))
            .collect();
        est.commit(map, start);
        est
    }

    #[test]
    fn test_first_observation_is_zero() {
        let est = CpuEstimator::new(100);
        assert_eq!(est.estimate(42, CpuCounterPair::new(5000, 5000), 5.0), 0.0);
    }

    #[test]
    fn test_delta_percentage() {
        let est = committed(&[(7, 600, 400)]);
        // 150 ticks over 5s at 100 ticks/s = 30%
        let pct = est.estimate(7, CpuCounterPair::new(700, 450), 5.0);
        assert!((pct - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_to_hundred() {
        let est = committed(&[(7, 0, 0)]);
        let pct = est.estimate(7, CpuCounterPair::new(10_000, 10_000), 1.0);
        assert_eq!(pct, 100.0);
    }

    #[test]
    fn test_negative_delta_clamped_to_zero() {
        let est = committed(&[(7, 1000, 1000)]);
        let pct = est.estimate(7, CpuCounterPair::new(10, 5), 5.0);
        assert_eq!(pct, 0.0);
    }

    #[test]
    fn test_elapsed_floor() {
        let est = committed(&[(7, 0, 0)]);
        // 1 tick over "0s" is computed against 0.1s: 0.01s / 0.1s = 10%
        let pct = est.estimate(7, CpuCounterPair::new(1, 0), 0.0);
        assert!((pct - 10.0).abs() < 1e-9);
        assert_eq!(est.estimate(7, CpuCounterPair::new(1, 0), f64::NAN), pct);
    }

    #[test]
    fn test_elapsed_since_last_poll() {
        let start = Instant::now();
        let est = CpuEstimator::starting_at(100, start);
        let later = start + Duration::from_millis(5500);
        assert!((est.elapsed_since_last_poll(later) - 5.5).abs() < 1e-9);
        assert_eq!(est.elapsed_since_last_poll(start), MIN_ELAPSED_SECS);
    }

    #[test]
    fn test_commit_replaces_state() {
        let mut est = committed(&[(1, 10, 10), (2, 20, 20)]);
        assert_eq!(est.tracked(), 2);

        let mut next = HashMap::new();
        next.insert(2, CpuCounterPair::new(30, 30));
        next.insert(3, CpuCounterPair::new(1, 1));
        est.commit(next, Instant::now());

        assert_eq!(est.tracked(), 2);
        assert!(!est.is_tracking(1));
        assert!(est.is_tracking(2));
        assert!(est.is_tracking(3));
    }

    #[test]
    fn test_zero_tick_rate_is_guarded() {
        let est = CpuEstimator::new(0);
        assert_eq!(est.ticks_per_second(), 1.0);
    }
}
