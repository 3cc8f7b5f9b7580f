//! Error types for checksum operations.
//!
//! Setup-time failures are [`ChecksumError`] and abort a scan before any
//! parallel work is scheduled. Failures for a single entry during the walk
//! are [`StorageError`] or [`DigestError`]; the engine turns those into an
//! [`EntryError`] record and keeps going.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that stop a checksum scan from starting (or from reporting).
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// The requested digest algorithm is not known.
    #[error("Unsupported digest algorithm: {name}")]
    UnsupportedAlgorithm { name: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root is missing or not a directory.
    #[error("Invalid root {path}: {reason}")]
    InvalidRoot { path: String, reason: String },

    /// The root directory itself could not be listed.
    #[error("Cannot list root directory: {0}")]
    RootListing(#[source] StorageError),

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {message}")]
    ThreadPool { message: String },

    /// Writing streamed results failed.
    #[error("Failed to write checksums: {0}")]
    Output(#[from] std::io::Error),
}

impl ChecksumError {
    /// Create an invalid root error.
    pub fn invalid_root(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Backend failure while inspecting, listing or reading one entry.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// Path not found (or vanished mid-scan).
    #[error("Path not found: {path}")]
    NotFound { path: String },

    /// Connection to a remote backend failed or dropped.
    #[error("Connection error at {path}: {message}")]
    Connection { path: String, message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Connection { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

/// Failure while feeding a byte stream into a hash.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The underlying stream failed mid-read.
    #[error("Read failed after {bytes_read} bytes: {source}")]
    Read {
        bytes_read: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Kind of per-entry error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Listing, inspecting or opening the entry failed.
    Storage,
    /// Hashing the entry's content failed.
    Digest,
}

/// Non-fatal error recorded against one path during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    /// Backend-native path of the failing entry.
    pub path: String,
    /// Kind of error.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl EntryError {
    /// Create a new entry error.
    pub fn new(path: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Record a storage failure.
    pub fn storage(error: &StorageError) -> Self {
        Self::new(error.path(), ErrorKind::Storage, error.to_string())
    }

    /// Record a digest failure for `path`.
    pub fn digest(path: impl Into<String>, error: &DigestError) -> Self {
        Self::new(path, ErrorKind::Digest, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_io() {
        let err = StorageError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert_eq!(err.path(), "/test/path");

        let err = StorageError::io("/gone", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_entry_error_from_storage() {
        let err = StorageError::Connection {
            path: "smb://nas/share/a.txt".into(),
            message: "reset by peer".into(),
        };
        let entry = EntryError::storage(&err);
        assert_eq!(entry.kind, ErrorKind::Storage);
        assert_eq!(entry.path, "smb://nas/share/a.txt");
        assert!(entry.message.contains("reset by peer"));
    }

    #[test]
    fn test_entry_error_from_digest() {
        let err = DigestError::Read {
            bytes_read: 4096,
            source: std::io::Error::other("disk gone"),
        };
        let entry = EntryError::digest("/data/big.iso", &err);
        assert_eq!(entry.kind, ErrorKind::Digest);
        assert!(entry.message.contains("4096"));
    }
}
