//! Scan progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use treesum_core::ScanStats;

/// Progress information during a checksum scan.
#[derive(Debug, Clone)]
pub struct ChecksumProgress {
    /// Number of files hashed so far.
    pub files_hashed: u64,
    /// Total bytes hashed so far.
    pub bytes_hashed: u64,
    /// Number of directories listed so far.
    pub dirs_listed: u64,
    /// Number of entries that failed.
    pub errors_count: u64,
    /// Last file hashed.
    pub current_path: String,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ChecksumProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_hashed: 0,
            bytes_hashed: 0,
            dirs_listed: 0,
            errors_count: 0,
            current_path: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate hash rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_hashed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate hash rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_hashed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ChecksumProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared counters updated by all workers of one scan.
#[derive(Debug)]
pub(crate) struct ProgressCounters {
    start: Instant,
    files_hashed: AtomicU64,
    bytes_hashed: AtomicU64,
    dirs_listed: AtomicU64,
    units_executed: AtomicU64,
    units_split: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

impl ProgressCounters {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            files_hashed: AtomicU64::new(0),
            bytes_hashed: AtomicU64::new(0),
            dirs_listed: AtomicU64::new(0),
            units_executed: AtomicU64::new(0),
            units_split: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Record a hashed file and return the new file count.
    pub fn record_file(&self, size: u64) -> u64 {
        self.bytes_hashed.fetch_add(size, Ordering::Relaxed);
        self.files_hashed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_dir(&self) {
        self.dirs_listed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_executed(&self) {
        self.units_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_split(&self) {
        self.units_split.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, current_path: &str) -> ChecksumProgress {
        ChecksumProgress {
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            bytes_hashed: self.bytes_hashed.load(Ordering::Relaxed),
            dirs_listed: self.dirs_listed.load(Ordering::Relaxed),
            errors_count: self.errors.load(Ordering::Relaxed),
            current_path: current_path.to_string(),
            elapsed: self.start.elapsed(),
        }
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            bytes_hashed: self.bytes_hashed.load(Ordering::Relaxed),
            dirs_listed: self.dirs_listed.load(Ordering::Relaxed),
            units_executed: self.units_executed.load(Ordering::Relaxed),
            units_split: self.units_split.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = ProgressCounters::new(Instant::now());
        assert_eq!(counters.record_file(10), 1);
        assert_eq!(counters.record_file(5), 2);
        counters.record_dir();
        counters.record_error();

        let progress = counters.snapshot("a.txt");
        assert_eq!(progress.files_hashed, 2);
        assert_eq!(progress.bytes_hashed, 15);
        assert_eq!(progress.dirs_listed, 1);
        assert_eq!(progress.errors_count, 1);

        let stats = counters.stats();
        assert_eq!(stats.files_hashed, 2);
        assert_eq!(stats.bytes_hashed, 15);
    }

    #[test]
    fn test_rates_with_zero_elapsed() {
        let progress = ChecksumProgress::new();
        assert_eq!(progress.files_per_second(), 0.0);
        assert_eq!(progress.bytes_per_second(), 0.0);
    }
}
