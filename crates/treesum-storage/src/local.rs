//! Local filesystem backend.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use treesum_core::{Entry, EntryType, Storage, StorageError};

use crate::type_of;

/// Storage over the local filesystem.
///
/// Type and size queries follow symbolic links, so a link to a file is
/// hashed as that file and a dangling link fails as not found.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// Create a local storage backend.
    pub fn new() -> Self {
        Self
    }

    /// Entry for a local path.
    pub fn entry(path: impl AsRef<Path>) -> Entry {
        Entry::new(path.as_ref().to_string_lossy().into_owned())
    }
}

impl Storage for LocalStorage {
    fn entry_type(&self, entry: &Entry) -> Result<EntryType, StorageError> {
        if let Some(hint) = entry.hint() {
            return Ok(hint);
        }
        let metadata = fs::metadata(entry.path()).map_err(|e| StorageError::io(entry.path(), e))?;
        Ok(type_of(metadata.file_type()))
    }

    fn list_children(&self, entry: &Entry) -> Result<Vec<Entry>, StorageError> {
        let read_dir = fs::read_dir(entry.path()).map_err(|e| StorageError::io(entry.path(), e))?;

        let mut children = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| StorageError::io(entry.path(), e))?;
            let path = dir_entry.path().to_string_lossy().into_owned();

            // Symlinks are resolved lazily through `entry_type`.
            let child = match dir_entry.file_type() {
                Ok(ft) if !ft.is_symlink() => Entry::with_type(path, type_of(ft)),
                _ => Entry::new(path),
            };
            children.push(child);
        }
        Ok(children)
    }

    fn size(&self, entry: &Entry) -> Result<u64, StorageError> {
        fs::metadata(entry.path())
            .map(|m| m.len())
            .map_err(|e| StorageError::io(entry.path(), e))
    }

    fn open_read<'a>(&'a self, entry: &Entry) -> Result<Box<dyn Read + Send + 'a>, StorageError> {
        let file = File::open(entry.path()).map_err(|e| StorageError::io(entry.path(), e))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join("sub/b.txt"), "").unwrap();

        temp
    }

    #[test]
    fn test_entry_types() {
        let temp = create_test_tree();
        let storage = LocalStorage::new();

        let root = LocalStorage::entry(temp.path());
        assert_eq!(storage.entry_type(&root).unwrap(), EntryType::Directory);
        assert!(storage.is_dir(&root).unwrap());

        let file = LocalStorage::entry(temp.path().join("a.txt"));
        assert!(storage.is_file(&file).unwrap());
        assert_eq!(storage.size(&file).unwrap(), 5);
    }

    #[test]
    fn test_list_children() {
        let temp = create_test_tree();
        let storage = LocalStorage::new();

        let mut children = storage
            .list_children(&LocalStorage::entry(temp.path()))
            .unwrap();
        children.sort_by(|a, b| a.path().cmp(b.path()));

        assert_eq!(children.len(), 2);
        assert!(children[0].path().ends_with("a.txt"));
        assert_eq!(children[0].hint(), Some(EntryType::File));
        assert_eq!(children[1].hint(), Some(EntryType::Directory));
    }

    #[test]
    fn test_open_read() {
        let temp = create_test_tree();
        let storage = LocalStorage::new();

        let mut content = String::new();
        storage
            .open_read(&LocalStorage::entry(temp.path().join("a.txt")))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_missing_entry_is_error() {
        let temp = create_test_tree();
        let storage = LocalStorage::new();

        let missing = LocalStorage::entry(temp.path().join("nope"));
        let err = storage.entry_type(&missing).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(storage.list_children(&missing).is_err());
    }
}
