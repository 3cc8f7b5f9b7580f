//! Scan results and statistics.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::{EntryError, ErrorKind};
use crate::record::ChecksumRecord;

/// Summary counters for a checksum scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files hashed successfully.
    pub files_hashed: u64,
    /// Bytes hashed across all files.
    pub bytes_hashed: u64,
    /// Directories listed.
    pub dirs_listed: u64,
    /// Work units that hashed their files directly.
    pub units_executed: u64,
    /// Work units that split their files into smaller units.
    pub units_split: u64,
    /// Entries that were neither file nor directory.
    pub skipped: u64,
}

/// Result of a checksum scan.
///
/// A scan with errors is partial: callers must look at both `records`
/// and `errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumReport {
    /// Deduplicated records (empty in stream mode).
    pub records: HashSet<ChecksumRecord>,

    /// Per-entry errors, sorted by path.
    pub errors: Vec<EntryError>,

    /// Summary statistics.
    pub stats: ScanStats,

    /// When the scan finished.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Whether the scan was cancelled before finishing.
    pub cancelled: bool,
}

impl ChecksumReport {
    /// Create a new report; errors are sorted by path.
    pub fn new(
        records: HashSet<ChecksumRecord>,
        mut errors: Vec<EntryError>,
        stats: ScanStats,
        scan_duration: Duration,
        cancelled: bool,
    ) -> Self {
        errors.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            records,
            errors,
            stats,
            scanned_at: SystemTime::now(),
            scan_duration,
            cancelled,
        }
    }

    /// Whether anything is missing from the result.
    pub fn is_partial(&self) -> bool {
        self.cancelled || !self.errors.is_empty()
    }

    /// Check if any entry failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of entries that failed.
    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of failures of the given kind.
    pub fn failed_count_of(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Look up the record for a relative path.
    pub fn get(&self, relative_path: &str) -> Option<&ChecksumRecord> {
        self.records
            .iter()
            .find(|r| r.relative_path == relative_path)
    }

    /// Records sorted by relative path.
    pub fn sorted_records(&self) -> Vec<&ChecksumRecord> {
        let mut records: Vec<_> = self.records.iter().collect();
        records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        records
    }
}
