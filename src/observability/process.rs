//! Default process metrics, sampled on each scrape.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

static PROCESS_START: OnceLock<f64> = OnceLock::new();

/// Record the process start time. Later calls keep the first value.
pub fn mark_start() -> f64 {
    *PROCESS_START.get_or_init(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    })
}

/// Point-in-time process values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub start_time_seconds: f64,
    /// Resident set size in bytes (Linux only)
    pub resident_memory_bytes: Option<u64>,
    /// Virtual memory size in bytes (Linux only)
    pub virtual_memory_bytes: Option<u64>,
    /// Number of open file descriptors (Linux only)
    pub open_fds: Option<u64>,
    /// User + system CPU time (Linux only)
    pub cpu_seconds_total: Option<f64>,
}

impl ProcessSnapshot {
    pub fn collect() -> Self {
        let mut snapshot = Self {
            start_time_seconds: mark_start(),
            ..Default::default()
        };
        snapshot.collect_platform();
        snapshot
    }

    #[cfg(target_os = "linux")]
    fn collect_platform(&mut self) {
        let page_size = sysconf_or(libc::_SC_PAGESIZE, 4096);
        if let Ok(content) = std::fs::read_to_string("/proc/self/statm") {
            let mut parts = content.split_whitespace();
            let size = parts.next().and_then(|v| v.parse::<u64>().ok());
            let resident = parts.next().and_then(|v| v.parse::<u64>().ok());
            self.virtual_memory_bytes = size.map(|pages| pages * page_size);
            self.resident_memory_bytes = resident.map(|pages| pages * page_size);
        }

        if let Ok(entries) = std::fs::read_dir("/proc/self/fd") {
            self.open_fds = Some(entries.count() as u64);
        }

        if let Ok(stat) = std::fs::read_to_string("/proc/self/stat") {
            let ticks = sysconf_or(libc::_SC_CLK_TCK, 100);
            self.cpu_seconds_total = parse_cpu_seconds(&stat, ticks);
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn collect_platform(&mut self) {}
}

/// A `sysconf` value, or `fallback` when the system does not report one.
#[cfg(target_os = "linux")]
fn sysconf_or(name: libc::c_int, fallback: u64) -> u64 {
    // SAFETY: sysconf only reads a system constant.
    let value = unsafe { libc::sysconf(name) };
    u64::try_from(value).ok().filter(|v| *v > 0).unwrap_or(fallback)
}

/// utime + stime from `/proc/self/stat`, converted with `ticks_per_second`.
fn parse_cpu_seconds(stat: &str, ticks_per_second: u64) -> Option<f64> {
    // The command name may contain spaces; fields resume after the last ')'.
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some((utime + stime) as f64 / ticks_per_second as f64)
}
