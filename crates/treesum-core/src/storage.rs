//! Storage capability contract shared by all backends.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Type of a storage entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else (devices, sockets, dangling links).
    Other,
}

/// Handle to an entry in some backend.
///
/// The path is backend-native: a filesystem path for local storage, a URL
/// for a network share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    path: String,
    hint: Option<EntryType>,
}

impl Entry {
    /// Create an entry whose type is not yet known.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hint: None,
        }
    }

    /// Create an entry whose type was learned while listing its parent.
    pub fn with_type(path: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            path: path.into(),
            hint: Some(entry_type),
        }
    }

    /// Backend-native path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Type cached from the parent listing, if any.
    pub fn hint(&self) -> Option<EntryType> {
        self.hint
    }
}

/// Uniform view over a backend.
///
/// Implementations translate backend failures into [`StorageError`].
/// Readers returned by [`Storage::open_read`] release their resources on
/// drop, so every exit path closes the stream.
pub trait Storage: Send + Sync {
    /// Determine whether the entry is a file, a directory or neither.
    ///
    /// A missing or inaccessible entry is an error, never [`EntryType::Other`].
    fn entry_type(&self, entry: &Entry) -> Result<EntryType, StorageError>;

    /// List the direct children of a directory, in no particular order.
    fn list_children(&self, entry: &Entry) -> Result<Vec<Entry>, StorageError>;

    /// Size of a file in bytes.
    fn size(&self, entry: &Entry) -> Result<u64, StorageError>;

    /// Open a file for sequential reading.
    fn open_read<'a>(&'a self, entry: &Entry) -> Result<Box<dyn Read + Send + 'a>, StorageError>;

    /// Check whether the entry is a regular file.
    fn is_file(&self, entry: &Entry) -> Result<bool, StorageError> {
        Ok(self.entry_type(entry)? == EntryType::File)
    }

    /// Check whether the entry is a directory.
    fn is_dir(&self, entry: &Entry) -> Result<bool, StorageError> {
        Ok(self.entry_type(entry)? == EntryType::Directory)
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn entry_type(&self, entry: &Entry) -> Result<EntryType, StorageError> {
        (**self).entry_type(entry)
    }

    fn list_children(&self, entry: &Entry) -> Result<Vec<Entry>, StorageError> {
        (**self).list_children(entry)
    }

    fn size(&self, entry: &Entry) -> Result<u64, StorageError> {
        (**self).size(entry)
    }

    fn open_read<'a>(&'a self, entry: &Entry) -> Result<Box<dyn Read + Send + 'a>, StorageError> {
        (**self).open_read(entry)
    }
}
