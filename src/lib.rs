//! cli-proc-monitor - sampling engine
//!
//! Finds running instances of one executable under /proc, estimates their
//! CPU usage from tick deltas between polls, names them after their working
//! directory and keeps a fixed-size history of samples.

pub mod config;
pub mod cpu;
pub mod discovery;
pub mod health_stats;
pub mod history;
pub mod metrics;
pub mod procfs;
pub mod sampler;
pub mod settings;
pub mod system;
pub mod temperature;

pub use cpu::{CpuCounterPair, CpuEstimator};
pub use discovery::{MonitorError, ProcessMonitor, ProcessRecord};
pub use history::{HistoryBuffer, HistorySample, ProcessSnapshot};
pub use procfs::ProcReader;
pub use sampler::Sampler;
