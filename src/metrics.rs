//! Prometheus metrics for the sampled processes and the sampler itself.

use prometheus::{Gauge, GaugeVec, Opts, Registry};

use crate::discovery::ProcessRecord;

/// Gauges refreshed after every poll.
#[derive(Clone)]
pub struct MonitorMetrics {
    pub cpu_percent: GaugeVec,
    pub memory_mb: GaugeVec,

    pub processes_total: Gauge,
    pub temperature: Gauge,
    pub history_samples: Gauge,
    pub poll_duration: Gauge,
    pub poll_success: Gauge,
}

impl MonitorMetrics {
    /// Creates and registers all metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let labels = &["pid", "name"];

        let cpu_percent = GaugeVec::new(
            Opts::new(
                "cli_proc_monitor_cpu_percent",
                "CPU usage per process in percent (delta over last poll)",
            ),
            labels,
        )?;
        let memory_mb = GaugeVec::new(
            Opts::new(
                "cli_proc_monitor_memory_mb",
                "Resident memory per process in megabytes",
            ),
            labels,
        )?;

        let processes_total = Gauge::new(
            "cli_proc_monitor_processes_total",
            "Number of target processes found by the last poll",
        )?;
        let temperature = Gauge::new(
            "cli_proc_monitor_temperature_celsius",
            "Primary temperature reading attached to the last sample",
        )?;
        let history_samples = Gauge::new(
            "cli_proc_monitor_history_samples",
            "Number of samples currently held in the history buffer",
        )?;
        let poll_duration = Gauge::new(
            "cli_proc_monitor_poll_duration_seconds",
            "Time spent on the last poll",
        )?;
        let poll_success = Gauge::new(
            "cli_proc_monitor_poll_success",
            "Whether the last poll was successful (1) or failed (0)",
        )?;

        registry.register(Box::new(cpu_percent.clone()))?;
        registry.register(Box::new(memory_mb.clone()))?;
        registry.register(Box::new(processes_total.clone()))?;
        registry.register(Box::new(temperature.clone()))?;
        registry.register(Box::new(history_samples.clone()))?;
        registry.register(Box::new(poll_duration.clone()))?;
        registry.register(Box::new(poll_success.clone()))?;

        Ok(Self {
            cpu_percent,
            memory_mb,
            processes_total,
            temperature,
            history_samples,
            poll_duration,
            poll_success,
        })
    }

    /// Replaces the per-process series with those of `processes`.
    ///
    /// Series of processes that disappeared are dropped by the reset.
    pub fn set_processes(&self, processes: &[ProcessRecord]) {
        self.cpu_percent.reset();
        self.memory_mb.reset();

        for p in processes {
            let pid = p.pid.to_string();
            let labels = &[pid.as_str(), p.name.as_str()];
            self.cpu_percent.with_label_values(labels).set(p.cpu_percent);
            self.memory_mb.with_label_values(labels).set(p.memory_mb);
        }
        self.processes_total.set(processes.len() as f64);
    }
}
