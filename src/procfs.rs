//! One-shot per-process readers for /proc/<pid>.
//!
//! Every field is read independently. A failure on one file leaves that
//! field zeroed or empty; it is never an error for the poll, since the
//! process may simply have exited between enumeration and the read.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cpu::CpuCounterPair;
use crate::system;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Raw per-process data gathered in a single poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcSnapshot {
    pub pid: u32,
    /// `comm` equals the target name.
    pub matches: bool,
    /// Resolved working directory, empty when unreadable.
    pub working_dir: String,
    pub counters: CpuCounterPair,
    pub memory_mb: f64,
    /// Epoch seconds.
    pub start_time: i64,
}

/// Reader bound to a proc root and the host's tick rate and page size.
#[derive(Debug, Clone)]
pub struct ProcReader {
    root: PathBuf,
    clock_ticks: u64,
    page_size: u64,
}

/// The fields of /proc/<pid>/stat this crate uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFields {
    pub utime: u64,
    pub stime: u64,
    pub starttime: u64,
}

impl ProcReader {
    /// Reader for `root` using sysconf values for tick rate and page size.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clock_ticks: system::clock_ticks_per_second(),
            page_size: system::page_size(),
        }
    }

    pub fn with_clock_ticks(mut self, ticks: u64) -> Self {
        self.clock_ticks = ticks.max(1);
        self
    }

    pub fn with_page_size(mut self, bytes: u64) -> Self {
        self.page_size = bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    fn pid_path(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    /// Reads everything the sampler needs about `pid`.
    ///
    /// When the identity check fails the remaining files are not read and
    /// the snapshot carries only `pid` with `matches == false`.
    ///
    /// `start_time` is 0 when `boot_time` is unknown or `stat` gave no
    /// starttime.
    pub fn read_snapshot(&self, pid: u32, target: &str, boot_time: Option<i64>) -> ProcSnapshot {
        if !self.matches_name(pid, target) {
            return ProcSnapshot {
                pid,
                ..Default::default()
            };
        }

        let stat = self.read_stat(pid);
        ProcSnapshot {
            pid,
            matches: true,
            working_dir: self.read_working_dir(pid),
            counters: CpuCounterPair::new(stat.utime, stat.stime),
            memory_mb: self.read_memory_mb(pid),
            start_time: start_time_epoch(boot_time, stat.starttime, self.clock_ticks),
        }
    }

    /// Exact, case-sensitive comparison of `comm` with `target`.
    pub fn matches_name(&self, pid: u32, target: &str) -> bool {
        match self.read_comm(pid) {
            Some(comm) => comm == target,
            None => false,
        }
    }

    /// Contents of /proc/<pid>/comm without the trailing newline.
    pub fn read_comm(&self, pid: u32) -> Option<String> {
        match fs::read_to_string(self.pid_path(pid).join("comm")) {
            Ok(s) => Some(s.trim_end_matches('\n').to_string()),
            Err(e) => {
                debug!("Failed to read comm for pid {}: {}", pid, e);
                None
            }
        }
    }

    pub fn read_working_dir(&self, pid: u32) -> String {
        match fs::read_link(self.pid_path(pid).join("cwd")) {
            Ok(p) => p.to_string_lossy().into_owned(),
            Err(e) => {
                debug!("Failed to read cwd for pid {}: {}", pid, e);
                String::new()
            }
        }
    }

    /// Resident memory in MB from the second field of `statm`.
    pub fn read_memory_mb(&self, pid: u32) -> f64 {
        match fs::read_to_string(self.pid_path(pid).join("statm")) {
            Ok(content) => {
                let pages = parse_statm_resident(&content);
                pages.saturating_mul(self.page_size) as f64 / BYTES_PER_MB
            }
            Err(e) => {
                debug!("Failed to read statm for pid {}: {}", pid, e);
                0.0
            }
        }
    }

    pub fn read_stat(&self, pid: u32) -> StatFields {
        match fs::read_to_string(self.pid_path(pid).join("stat")) {
            Ok(content) => parse_stat(&content),
            Err(e) => {
                debug!("Failed to read stat for pid {}: {}", pid, e);
                StatFields::default()
            }
        }
    }
}

/// Epoch start time from `starttime` ticks since boot, 0 if either is unknown.
pub fn start_time_epoch(boot_time: Option<i64>, starttime_ticks: u64, clock_ticks: u64) -> i64 {
    match boot_time {
        Some(boot) if starttime_ticks > 0 => {
            let since_boot = i64::try_from(starttime_ticks / clock_ticks.max(1)).unwrap_or(i64::MAX);
            boot.saturating_add(since_boot)
        }
        _ => 0,
    }
}

/// Resident page count from a `statm` line ("size resident shared ...").
pub fn parse_statm_resident(content: &str) -> u64 {
    content
        .split_whitespace()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Parses utime, stime and starttime out of a `stat` line.
///
/// The command name may contain spaces and parentheses, so fields are
/// counted from the last `)`. Missing or malformed fields become 0.
pub fn parse_stat(content: &str) -> StatFields {
    let Some(idx) = content.rfind(')') else {
        return StatFields::default();
    };
    let fields: Vec<&str> = content[idx + 1..].split_whitespace().collect();
    let field = |i: usize| -> u64 { fields.get(i).and_then(|v| v.parse().ok()).unwrap_or(0) };

    // Index 0 is the state field (stat field 3).
    StatFields {
        utime: field(11),
        stime: field(12),
        starttime: field(19),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const STAT_LINE: &str = "4242 (claude) S 1 4242 4242 0 -1 4194560 12007 0 0 0 \
                             700 450 0 0 20 0 11 0 250000 1183014912 30000 \
                             18446744073709551615 1 1 0 0 0 0 0 16781312 16386 0 0 0 17 3 0 0 0 0 0";

    fn write_proc(root: &Path, pid: u32, comm: &str, stat: &str, statm: &str, cwd: Option<&str>) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("comm"), format!("{}\n", comm)).unwrap();
        fs::write(dir.join("stat"), stat).unwrap();
        fs::write(dir.join("statm"), statm).unwrap();
        if let Some(target) = cwd {
            std::os::unix::fs::symlink(target, dir.join("cwd")).unwrap();
        }
    }

    #[test]
    fn test_parse_stat() {
        let f = parse_stat(STAT_LINE);
        assert_eq!(f.utime, 700);
        assert_eq!(f.stime, 450);
        assert_eq!(f.starttime, 250000);
    }

    #[test]
    fn test_parse_stat_name_with_parens_and_spaces() {
        let line = STAT_LINE.replace("(claude)", "(my (odd) name)");
        let f = parse_stat(&line);
        assert_eq!(f.utime, 700);
        assert_eq!(f.stime, 450);
    }

    #[test]
    fn test_parse_stat_malformed() {
        assert_eq!(parse_stat("garbage"), StatFields::default());
        assert_eq!(parse_stat("1 (x) S 1 2"), StatFields::default());
        let f = parse_stat("1 (x) S 0 0 0 0 0 0 0 0 0 0 abc 9");
        assert_eq!(f.utime, 0);
        assert_eq!(f.stime, 9);
    }

    #[test]
    fn test_parse_statm() {
        assert_eq!(parse_statm_resident("288717 25600 2310 19 0 70455 0\n"), 25600);
        assert_eq!(parse_statm_resident("288717"), 0);
        assert_eq!(parse_statm_resident("1 x 2"), 0);
    }

    #[test]
    fn test_read_snapshot_matching_process() {
        let dir = TempDir::new().unwrap();
        write_proc(
            dir.path(),
            4242,
            "claude",
            STAT_LINE,
            "288717 25600 2310 19 0 70455 0\n",
            Some("/home/user/demo"),
        );
        let reader = ProcReader::new(dir.path())
            .with_clock_ticks(100)
            .with_page_size(4096);

        let snap = reader.read_snapshot(4242, "claude", Some(1_700_000_000));
        assert!(snap.matches);
        assert_eq!(snap.working_dir, "/home/user/demo");
        assert_eq!(snap.counters, CpuCounterPair::new(700, 450));
        assert!((snap.memory_mb - 100.0).abs() < 1e-9);
        assert_eq!(snap.start_time, 1_700_000_000 + 2500);
    }

    #[test]
    fn test_identity_is_exact_and_case_sensitive() {
        let dir = TempDir::new().unwrap();
        write_proc(dir.path(), 1, "Claude", STAT_LINE, "1 1", None);
        write_proc(dir.path(), 2, "claude-x", STAT_LINE, "1 1", None);
        let reader = ProcReader::new(dir.path());

        assert!(!reader.matches_name(1, "claude"));
        assert!(!reader.matches_name(2, "claude"));
        assert!(!reader.read_snapshot(1, "claude", Some(0)).matches);
    }

    #[test]
    fn test_vanished_process_does_not_match() {
        let dir = TempDir::new().unwrap();
        let reader = ProcReader::new(dir.path());
        let snap = reader.read_snapshot(999, "claude", Some(0));
        assert!(!snap.matches);
        assert_eq!(snap.pid, 999);
    }

    #[test]
    fn test_unreadable_fields_are_zeroed() {
        let dir = TempDir::new().unwrap();
        let pid_dir = dir.path().join("77");
        fs::create_dir_all(&pid_dir).unwrap();
        fs::write(pid_dir.join("comm"), "claude\n").unwrap();
        let reader = ProcReader::new(dir.path()).with_clock_ticks(100);

        let snap = reader.read_snapshot(77, "claude", Some(1_699_999_000));
        assert!(snap.matches);
        assert_eq!(snap.working_dir, "");
        assert_eq!(snap.counters, CpuCounterPair::default());
        assert_eq!(snap.memory_mb, 0.0);
        assert_eq!(snap.start_time, 0);
    }

    #[test]
    fn test_unknown_boot_time_zeroes_start_time() {
        let dir = TempDir::new().unwrap();
        let stat = STAT_LINE.replace(" 250000 ", " 500000 ");
        write_proc(dir.path(), 4242, "claude", &stat, "1 1", None);
        let reader = ProcReader::new(dir.path()).with_clock_ticks(100);

        let snap = reader.read_snapshot(4242, "claude", None);
        assert!(snap.matches);
        assert_eq!(snap.counters, CpuCounterPair::new(700, 450));
        assert_eq!(snap.start_time, 0);
    }

    #[test]
    fn test_start_time_epoch() {
        assert_eq!(start_time_epoch(Some(1_000), 500, 100), 1_005);
        assert_eq!(start_time_epoch(Some(1_000), 0, 100), 0);
        assert_eq!(start_time_epoch(None, 500, 100), 0);
        assert_eq!(start_time_epoch(Some(i64::MAX), u64::MAX, 1), i64::MAX);
    }
}
