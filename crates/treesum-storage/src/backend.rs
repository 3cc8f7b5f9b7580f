//! Backend selection from a location string.

use std::io::Read;
use std::path::PathBuf;

use treesum_core::{Entry, EntryType, Storage, StorageError};

use crate::local::LocalStorage;
use crate::share::{SHARE_SCHEME, ShareParseError, ShareStorage, ShareUrl};

/// Where a scan starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A local directory.
    Local(PathBuf),
    /// A directory on a network share.
    Share(ShareUrl),
}

impl Location {
    /// Parse a local path or an `smb://` URL.
    pub fn parse(input: &str) -> Result<Self, ShareParseError> {
        let is_url = input
            .split_once("://")
            .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case(SHARE_SCHEME));
        if is_url {
            ShareUrl::parse(input).map(Self::Share)
        } else {
            Ok(Self::Local(PathBuf::from(input)))
        }
    }
}

/// A storage backend chosen at construction.
#[derive(Debug)]
pub enum Backend {
    /// Local filesystem rooted at a directory.
    Local {
        /// Storage adapter.
        storage: LocalStorage,
        /// Scan root.
        root: PathBuf,
    },
    /// Connected network share.
    Share(ShareStorage),
}

impl Backend {
    /// Local backend rooted at `root`.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::Local {
            storage: LocalStorage::new(),
            root: root.into(),
        }
    }

    /// Network share backend.
    pub fn share(storage: ShareStorage) -> Self {
        Self::Share(storage)
    }

    /// Entry for the scan root.
    pub fn root_entry(&self) -> Entry {
        match self {
            Self::Local { root, .. } => LocalStorage::entry(root),
            Self::Share(storage) => storage.root_entry(),
        }
    }

    fn storage(&self) -> &dyn Storage {
        match self {
            Self::Local { storage, .. } => storage,
            Self::Share(storage) => storage,
        }
    }
}

impl Storage for Backend {
    fn entry_type(&self, entry: &Entry) -> Result<EntryType, StorageError> {
        self.storage().entry_type(entry)
    }

    fn list_children(&self, entry: &Entry) -> Result<Vec<Entry>, StorageError> {
        self.storage().list_children(entry)
    }

    fn size(&self, entry: &Entry) -> Result<u64, StorageError> {
        self.storage().size(entry)
    }

    fn open_read<'a>(&'a self, entry: &Entry) -> Result<Box<dyn Read + Send + 'a>, StorageError> {
        self.storage().open_read(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse() {
        assert_eq!(
            Location::parse("/var/data").unwrap(),
            Location::Local(PathBuf::from("/var/data"))
        );
        assert!(matches!(
            Location::parse("smb://nas/public/docs").unwrap(),
            Location::Share(url) if url.share() == "public"
        ));
        assert!(Location::parse("smb://nas").is_err());
    }

    #[test]
    fn test_local_backend_root_entry() {
        let backend = Backend::local("/var/data");
        assert_eq!(backend.root_entry().path(), "/var/data");
    }
}
