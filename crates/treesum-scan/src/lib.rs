//! Parallel checksum engine for treesum.
//!
//! # Overview
//!
//! `treesum-scan` computes a digest for every regular file below a root
//! directory of any [`Storage`] backend. Key features:
//!
//! - **Work splitting** of large file batches by count or cumulative size
//! - **Fork/join** execution on a dedicated rayon pool
//! - **Partial results**: per-file failures are reported, not fatal
//! - **Collect or stream** results (in-memory set or JSON lines)
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use treesum_scan::{ChecksumConfig, Checksummer, HashAlgorithm};
//! use treesum_storage::LocalStorage;
//!
//! let checksummer = Checksummer::new(ChecksumConfig::new(HashAlgorithm::Sha256)).unwrap();
//! let report = checksummer
//!     .checksums(&LocalStorage::new(), &LocalStorage::entry("/path/to/scan"))
//!     .unwrap();
//!
//! for record in report.sorted_records() {
//!     println!("{}  {}", record.digest, record.relative_path);
//! }
//! println!("Failed entries: {}", report.failed_count());
//! ```
//!
//! # Streaming
//!
//! Write records to a file as they are produced instead of holding them
//! in memory:
//!
//! ```rust,no_run
//! use std::fs::File;
//! use treesum_scan::{ChecksumConfig, Checksummer};
//! use treesum_storage::LocalStorage;
//!
//! let checksummer = Checksummer::new(ChecksumConfig::default()).unwrap();
//! let out = File::create("checksums.jsonl").unwrap();
//! let report = checksummer
//!     .write_checksums(&LocalStorage::new(), &LocalStorage::entry("/data"), out)
//!     .unwrap();
//! println!("Wrote {} lines", report.stats.files_hashed);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use treesum_scan::{ChecksumConfig, Checksummer};
//!
//! let checksummer = Checksummer::new(ChecksumConfig::default()).unwrap();
//! let mut progress_rx = checksummer.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Hashed {} files", progress.files_hashed);
//!     }
//! });
//! ```

mod bench;
mod cancel;
mod checksummer;
mod digest;
mod progress;
mod sink;
mod split;

pub use bench::{BenchmarkReport, TimingStats};
pub use cancel::CancelToken;
pub use checksummer::Checksummer;
pub use digest::{StreamingDigest, digest_bytes};
pub use progress::ChecksumProgress;
pub use sink::{ChannelSink, CollectSink, JsonLinesWriter, RecordSink};
pub use split::{fits_in_one_unit, split_ranges};

// Re-export core types for convenience
pub use treesum_core::{
    ChecksumConfig, ChecksumError, ChecksumRecord, ChecksumReport, DigestError, Entry, EntryError,
    EntryType, ErrorKind, HashAlgorithm, ScanStats, SplitPolicy, Storage, StorageError,
};
