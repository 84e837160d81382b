//! System-wide values read from /proc and sysconf.
//!
//! The snapshot reader needs three host constants: the clock tick rate of
//! the CPU counters, the page size behind `statm`, and the boot time used to
//! turn `starttime` into an epoch timestamp.

use std::fs;
use std::path::Path;

/// Tick rate assumed when `sysconf(_SC_CLK_TCK)` is unavailable.
pub const DEFAULT_CLOCK_TICKS: u64 = 100;

/// Page size assumed when `sysconf(_SC_PAGESIZE)` is unavailable.
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Returns the kernel clock tick rate (USER_HZ).
pub fn clock_ticks_per_second() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a constant.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        DEFAULT_CLOCK_TICKS
    }
}

/// Returns the memory page size in bytes.
pub fn page_size() -> u64 {
    // SAFETY: see clock_ticks_per_second.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// Reads system uptime in seconds from `<proc_root>/uptime`.
///
/// Format: "350735.47 234388.90" (uptime, idle).
pub fn read_uptime_seconds(proc_root: &Path) -> Result<f64, String> {
    let path = proc_root.join("uptime");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_uptime(&content)
}

fn parse_uptime(content: &str) -> Result<f64, String> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| "Invalid uptime format: empty".to_string())?;
    let uptime = first
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse uptime '{}': {}", first, e))?;
    if !uptime.is_finite() || uptime < 0.0 {
        return Err(format!("Invalid uptime value '{}'", first));
    }
    Ok(uptime)
}

/// Boot time in epoch seconds, derived as `now - uptime`.
///
/// `None` when uptime cannot be read or parsed; start times are then
/// reported as 0.
pub fn boot_time_epoch(proc_root: &Path, now_epoch: i64) -> Option<i64> {
    match read_uptime_seconds(proc_root) {
        Ok(uptime) => Some(now_epoch.saturating_sub(uptime as i64)),
        Err(e) => {
            tracing::debug!("Boot time unavailable: {}", e);
            None
        }
    }
}
