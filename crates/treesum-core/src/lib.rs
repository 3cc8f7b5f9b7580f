//! Core types and traits for treesum.
//!
//! This crate provides the fundamental data structures used throughout
//! the treesum workspace: checksum records, scan reports, configuration,
//! the error taxonomy, and the storage capability contract.

mod config;
mod error;
mod record;
mod report;
mod storage;

pub use config::{
    ChecksumConfig, ChecksumConfigBuilder, ChecksumConfigBuilderError, DEFAULT_BUFFER_SIZE,
    DEFAULT_MAX_BATCH_BYTES, HashAlgorithm, SplitPolicy,
};
pub use error::{ChecksumError, DigestError, EntryError, ErrorKind, StorageError};
pub use record::{ChecksumRecord, relative_path, to_hex};
pub use report::{ChecksumReport, ScanStats};
pub use storage::{Entry, EntryType, Storage};
