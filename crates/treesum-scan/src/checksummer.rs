//! Work-splitting parallel checksum engine.
//!
//! A scan is a tree of work units. Each unit holds a list of entries, sorts
//! them into files and directories, and then:
//!
//! 1. hashes its files directly when the split policy says they fit in one
//!    unit, or splits them into `branch_factor` contiguous groups that each
//!    become a new unit;
//! 2. lists every directory and turns each non-empty listing into its own
//!    unit;
//! 3. forks all new units on the worker pool and joins them before it
//!    returns.

use std::collections::HashSet;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use treesum_core::{
    ChecksumConfig, ChecksumError, ChecksumRecord, ChecksumReport, Entry, EntryError, EntryType,
    SplitPolicy, Storage, relative_path,
};

use crate::cancel::CancelToken;
use crate::digest::StreamingDigest;
use crate::progress::{ChecksumProgress, ProgressCounters};
use crate::sink::{self, ChannelSink, CollectSink, RecordSink};
use crate::split::{fits_in_one_unit, split_ranges};

/// How long the stream writer waits for a record before flushing.
const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// Computes checksums for every file below a root directory.
pub struct Checksummer {
    config: ChecksumConfig,
    pool: ThreadPool,
    cancel: CancelToken,
    progress_tx: broadcast::Sender<ChecksumProgress>,
}

impl Checksummer {
    /// Create a checksummer with its own worker pool.
    pub fn new(config: ChecksumConfig) -> Result<Self, ChecksumError> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("treesum-worker-{i}"))
            .build()
            .map_err(|e| ChecksumError::ThreadPool {
                message: e.to_string(),
            })?;
        let (progress_tx, _) = broadcast::channel(100);

        Ok(Self {
            config,
            pool,
            cancel: CancelToken::new(),
            progress_tx,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ChecksumConfig {
        &self.config
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ChecksumProgress> {
        self.progress_tx.subscribe()
    }

    /// Token that cancels running and future scans of this checksummer.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Collect mode: hash the tree below `root` into an in-memory set.
    pub fn checksums<S>(&self, storage: &S, root: &Entry) -> Result<ChecksumReport, ChecksumError>
    where
        S: Storage + ?Sized,
    {
        let sink = CollectSink::new();
        let mut report = self.run(storage, root, &sink, &self.cancel.child())?;
        report.records = sink.into_records();
        Ok(report)
    }

    /// Run a scan that delivers every record to a caller-supplied sink.
    ///
    /// The returned report carries no records.
    pub fn scan_into<S>(
        &self,
        storage: &S,
        root: &Entry,
        sink: &dyn RecordSink,
    ) -> Result<ChecksumReport, ChecksumError>
    where
        S: Storage + ?Sized,
    {
        self.run(storage, root, sink, &self.cancel.child())
    }

    /// Stream mode: write each record to `out` as a JSON line as soon as it
    /// is produced.
    ///
    /// Line order follows completion order. The returned report carries no
    /// records; `stats.files_hashed` counts the lines written. If writing
    /// fails, the scan is cancelled and the write error is returned.
    pub fn write_checksums<S, W>(
        &self,
        storage: &S,
        root: &Entry,
        out: W,
    ) -> Result<ChecksumReport, ChecksumError>
    where
        S: Storage + ?Sized,
        W: Write,
    {
        let run_cancel = self.cancel.child();
        let (tx, rx) = crossbeam_channel::unbounded();

        thread::scope(|scope| {
            let scan_cancel = run_cancel.clone();
            let scan = scope.spawn(move || {
                let sink = ChannelSink::new(tx);
                self.run(storage, root, &sink, &scan_cancel)
            });

            let drained = sink::drain(rx, out, DRAIN_INTERVAL);
            if drained.is_err() {
                run_cancel.cancel();
            }

            let report = match scan.join() {
                Ok(report) => report,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            let written = drained?;
            let report = report?;
            debug!(written, "Finished streaming checksums");
            Ok(report)
        })
    }

    fn run<S>(
        &self,
        storage: &S,
        root: &Entry,
        sink: &dyn RecordSink,
        cancel: &CancelToken,
    ) -> Result<ChecksumReport, ChecksumError>
    where
        S: Storage + ?Sized,
    {
        let start = Instant::now();

        // Verify root is a directory
        match storage.entry_type(root) {
            Ok(EntryType::Directory) => {}
            Ok(_) => return Err(ChecksumError::invalid_root(root.path(), "not a directory")),
            Err(e) => return Err(ChecksumError::invalid_root(root.path(), e.to_string())),
        }
        let children = storage
            .list_children(root)
            .map_err(ChecksumError::RootListing)?;

        info!(
            root = root.path(),
            algorithm = %self.config.algorithm,
            threads = self.num_threads(),
            "Starting checksum scan"
        );

        let walk = Walk {
            storage,
            root_path: root.path(),
            config: &self.config,
            sink,
            cancel,
            progress_tx: &self.progress_tx,
            counters: ProgressCounters::new(start),
            errors: DashMap::new(),
        };

        if !children.is_empty() {
            self.pool.install(|| walk.run_unit(children));
        }

        let _ = self.progress_tx.send(walk.counters.snapshot(""));
        let stats = walk.counters.stats();
        let errors: Vec<EntryError> = walk.errors.into_iter().map(|(_, e)| e).collect();
        let cancelled = cancel.is_cancelled();
        let scan_duration = start.elapsed();

        info!(
            files = stats.files_hashed,
            bytes = stats.bytes_hashed,
            errors = errors.len(),
            cancelled,
            elapsed_ms = scan_duration.as_millis() as u64,
            "Checksum scan finished"
        );

        Ok(ChecksumReport::new(
            HashSet::new(),
            errors,
            stats,
            scan_duration,
            cancelled,
        ))
    }
}

/// Shared, read-only state for one scan plus its concurrent outputs.
struct Walk<'a, S: ?Sized> {
    storage: &'a S,
    root_path: &'a str,
    config: &'a ChecksumConfig,
    sink: &'a dyn RecordSink,
    cancel: &'a CancelToken,
    progress_tx: &'a broadcast::Sender<ChecksumProgress>,
    counters: ProgressCounters,
    errors: DashMap<String, EntryError>,
}

impl<S: Storage + ?Sized> Walk<'_, S> {
    /// Execute one work unit, forking and joining any sub-units.
    fn run_unit(&self, items: Vec<Entry>) {
        if self.cancel.is_cancelled() {
            return;
        }

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for item in items {
            match self.storage.entry_type(&item) {
                Ok(EntryType::File) => files.push(item),
                Ok(EntryType::Directory) => dirs.push(item),
                Ok(EntryType::Other) => {
                    trace!(path = item.path(), "Skipping entry that is neither file nor directory");
                    self.counters.record_skipped();
                }
                Err(e) => self.record_error(EntryError::storage(&e)),
            }
        }

        let mut units: Vec<Vec<Entry>> = Vec::new();
        let mut leaf = Vec::new();

        if !files.is_empty() {
            if self.fits(&files) {
                self.counters.record_executed();
                leaf = files;
            } else {
                let ranges = split_ranges(files.len(), self.config.branch_factor);
                debug!(files = files.len(), groups = ranges.len(), "Splitting file batch");
                self.counters.record_split();
                for range in ranges.iter().rev() {
                    units.push(files.split_off(range.start));
                }
            }
        }

        for dir in dirs {
            match self.storage.list_children(&dir) {
                Ok(children) => {
                    self.counters.record_dir();
                    if !children.is_empty() {
                        units.push(children);
                    }
                }
                Err(e) => self.record_error(EntryError::storage(&e)),
            }
        }

        if units.is_empty() {
            self.work(&leaf);
            return;
        }

        rayon::scope(|s| {
            for unit in units {
                s.spawn(move |_| self.run_unit(unit));
            }
            self.work(&leaf);
        });
    }

    fn fits(&self, files: &[Entry]) -> bool {
        fits_in_one_unit(self.config.split_policy, files.len(), || {
            self.batch_bytes(files)
        })
    }

    /// Cumulative size of a batch, stopping once it exceeds the threshold.
    fn batch_bytes(&self, files: &[Entry]) -> u64 {
        let limit = match self.config.split_policy {
            SplitPolicy::Size { max_bytes } => max_bytes,
            SplitPolicy::Count { .. } => u64::MAX,
        };

        let mut total = 0u64;
        for file in files {
            // Unreadable sizes count as empty here; hashing reports them.
            total = total.saturating_add(self.storage.size(file).unwrap_or(0));
            if total > limit {
                break;
            }
        }
        total
    }

    /// Leaf execution: hash a batch of files sequentially.
    fn work(&self, files: &[Entry]) {
        if files.is_empty() {
            return;
        }

        let mut digest = StreamingDigest::new(self.config.algorithm);
        for file in files {
            if self.cancel.is_cancelled() {
                return;
            }
            match self.hash_file(&mut digest, file) {
                Ok(record) => {
                    let count = self.counters.record_file(record.file_size);
                    let interval = self.config.progress_interval;
                    if interval > 0 && count % interval == 0 {
                        let _ = self.progress_tx.send(self.counters.snapshot(file.path()));
                    }
                    self.sink.accept(record);
                }
                Err(error) => self.record_error(error),
            }
        }
    }

    fn hash_file(&self, digest: &mut StreamingDigest, file: &Entry) -> Result<ChecksumRecord, EntryError> {
        let relative = relative_path(self.root_path, file.path());
        let size = self
            .storage
            .size(file)
            .map_err(|e| EntryError::storage(&e))?;
        let reader = self
            .storage
            .open_read(file)
            .map_err(|e| EntryError::storage(&e))?;
        let bytes = digest
            .compute(reader, self.config.buffer_size)
            .map_err(|e| EntryError::digest(file.path(), &e))?;

        trace!(path = %relative, size, "Hashed file");
        Ok(ChecksumRecord::from_digest(relative, size, &bytes))
    }

    fn record_error(&self, error: EntryError) {
        warn!(path = %error.path, kind = ?error.kind, "{}", error.message);
        self.counters.record_error();
        self.errors.insert(error.path.clone(), error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use treesum_core::HashAlgorithm;
    use treesum_storage::LocalStorage;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join("sub/b.txt"), "").unwrap();

        temp
    }

    fn single_threaded(policy: SplitPolicy) -> Checksummer {
        let config = ChecksumConfig::builder()
            .algorithm(HashAlgorithm::Md5)
            .split_policy(policy)
            .threads(1usize)
            .build()
            .unwrap();
        Checksummer::new(config).unwrap()
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let checksummer = single_threaded(SplitPolicy::default());

        let report = checksummer
            .checksums(&LocalStorage::new(), &LocalStorage::entry(temp.path()))
            .unwrap();

        assert!(!report.is_partial());
        assert_eq!(report.records.len(), 2);
        assert_eq!(
            report.get("a.txt").unwrap().digest,
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(report.get("sub/b.txt").unwrap().file_size, 0);
        assert_eq!(report.stats.dirs_listed, 1);
        assert_eq!(checksummer.num_threads(), 1);
    }

    #[test]
    fn test_count_policy_splits_to_single_files() {
        let temp = TempDir::new().unwrap();
        for i in 0..8 {
            fs::write(temp.path().join(format!("f{i}.bin")), vec![i as u8; 100]).unwrap();
        }
        let checksummer = single_threaded(SplitPolicy::Count { max_files: 1 });

        let report = checksummer
            .checksums(&LocalStorage::new(), &LocalStorage::entry(temp.path()))
            .unwrap();

        assert_eq!(report.records.len(), 8);
        // Binary splitting of 8 files down to singletons: 7 splits, 8 leaves
        assert_eq!(report.stats.units_split, 7);
        assert_eq!(report.stats.units_executed, 8);
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = create_test_tree();
        let checksummer = single_threaded(SplitPolicy::default());
        let storage = LocalStorage::new();

        let err = checksummer
            .checksums(&storage, &LocalStorage::entry(temp.path().join("a.txt")))
            .unwrap_err();
        assert!(matches!(err, ChecksumError::InvalidRoot { .. }));

        let err = checksummer
            .checksums(&storage, &LocalStorage::entry(temp.path().join("missing")))
            .unwrap_err();
        assert!(matches!(err, ChecksumError::InvalidRoot { .. }));
    }

    #[test]
    fn test_cancelled_before_start() {
        let temp = create_test_tree();
        let checksummer = single_threaded(SplitPolicy::default());
        checksummer.cancel_token().cancel();

        let report = checksummer
            .checksums(&LocalStorage::new(), &LocalStorage::entry(temp.path()))
            .unwrap();
        assert!(report.cancelled);
        assert!(report.is_partial());
        assert!(report.records.is_empty());
    }
}
