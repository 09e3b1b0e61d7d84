//! Point-in-time system resource sampling.
//!
//! CPU percent comes from two `/proc/stat` snapshots separated by the
//! sampling interval; memory is used system memory from `/proc/meminfo`.
//! Both are system-wide, not per-process, which keeps the numbers comparable
//! with result files produced by earlier harness versions. Non-Linux
//! platforms report zero.

use std::time::Duration;

/// One resource observation.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSample {
    /// Busy share of all CPUs over the sampling interval, in percent.
    pub cpu_percent: f64,
    /// Used system memory in MB.
    pub memory_mb: f64,
}

/// Samples CPU and memory once per call.
///
/// The single point sample after each operation (rather than integration
/// over the operation's interval) is a known inaccuracy kept on purpose:
/// changing the measurement semantics would break comparability with result
/// files from earlier harness versions.
#[derive(Debug, Clone)]
pub struct ResourceSampler {
    interval: Duration,
}

impl ResourceSampler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Block for the sampling interval and return one observation.
    pub fn sample(&self) -> ResourceSample {
        ResourceSample {
            cpu_percent: self.cpu_percent(),
            memory_mb: used_memory_mb(),
        }
    }

    fn cpu_percent(&self) -> f64 {
        let Some(before) = read_cpu_times() else {
            tracing::debug!("cpu times unavailable on this platform");
            return 0.0;
        };
        std::thread::sleep(self.interval);
        let Some(after) = read_cpu_times() else {
            return 0.0;
        };

        let total = after.total.saturating_sub(before.total);
        let idle = after.idle.saturating_sub(before.idle);
        if total == 0 {
            return 0.0;
        }
        (total - idle) as f64 / total as f64 * 100.0
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Copy)]
struct CpuTimes {
    idle: u64,
    total: u64,
}

#[cfg(target_os = "linux")]
fn read_cpu_times() -> Option<CpuTimes> {
    let stat = std::fs::read_to_string("/proc/stat").ok()?;
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 5 {
        return None;
    }
    // user nice system idle iowait irq softirq steal ...
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let total: u64 = fields.iter().sum();
    Some(CpuTimes { idle, total })
}

#[cfg(not(target_os = "linux"))]
fn read_cpu_times() -> Option<CpuTimes> {
    None
}

#[cfg(target_os = "linux")]
fn used_memory_mb() -> f64 {
    let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") else {
        return 0.0;
    };
    let field_kb = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|n| n.parse().ok())
    };
    match (field_kb("MemTotal"), field_kb("MemAvailable")) {
        (Some(total), Some(available)) => total.saturating_sub(available) as f64 / 1024.0,
        _ => 0.0,
    }
}

#[cfg(not(target_os = "linux"))]
fn used_memory_mb() -> f64 {
    tracing::debug!("memory sampling unavailable on this platform");
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_within_bounds() {
        let sampler = ResourceSampler::new(Duration::from_millis(20));
        let sample = sampler.sample();
        assert!(sample.cpu_percent >= 0.0);
        assert!(sample.cpu_percent <= 100.0);
        assert!(sample.memory_mb >= 0.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_reports_nonzero_memory() {
        let sample = ResourceSampler::new(Duration::from_millis(10)).sample();
        assert!(sample.memory_mb > 0.0);
    }
}
