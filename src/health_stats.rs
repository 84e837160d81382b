//! Running statistics about polls and HTTP traffic for the /health page.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Clone, Copy, Default)]
struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

#[derive(Default)]
struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// (last, avg, max, min, count)
    fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

pub struct HealthStats {
    discovered_processes: Stat,
    poll_duration_seconds: Stat,
    total_polls: AtomicU64,
    failed_polls: AtomicU64,
    http_requests: AtomicU64,
    started: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            discovered_processes: Stat::default(),
            poll_duration_seconds: Stat::default(),
            total_polls: AtomicU64::new(0),
            failed_polls: AtomicU64::new(0),
            http_requests: AtomicU64::new(0),
            started: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_poll(&self, discovered: usize, duration_seconds: f64) {
        self.discovered_processes.add_sample(discovered as f64);
        self.poll_duration_seconds.add_sample(duration_seconds);
        self.total_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_poll(&self) {
        self.failed_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_polls(&self) -> u64 {
        self.total_polls.load(Ordering::Relaxed)
    }

    pub fn failed_polls(&self) -> u64 {
        self.failed_polls.load(Ordering::Relaxed)
    }

    pub fn http_requests(&self) -> u64 {
        self.http_requests.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let (dp_cur, dp_avg, dp_max, dp_min, _) = self.discovered_processes.snapshot();
        let (pd_cur, pd_avg, pd_max, pd_min, _) = self.poll_duration_seconds.snapshot();

        let left_col = 22usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "metric",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out, "{}", "-".repeat(left_col + 3 + (col_w + 3) * 4)).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "discovered processes",
            format!("{:.0}", dp_cur),
            format!("{:.1}", dp_avg),
            format!("{:.0}", dp_max),
            format!("{:.0}", dp_min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "poll duration (s)",
            format!("{:.3}", pd_cur),
            format!("{:.3}", pd_avg),
            format!("{:.3}", pd_max),
            format!("{:.3}", pd_min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "number of polls: {}", self.total_polls()).ok();
        writeln!(out, "failed polls: {}", self.failed_polls()).ok();
        writeln!(out, "http requests: {}", self.http_requests()).ok();
        writeln!(out, "uptime (s): {}", self.uptime_seconds()).ok();

        out
    }
}
