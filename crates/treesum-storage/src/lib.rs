//! Storage backends for treesum.
//!
//! Every backend implements [`treesum_core::Storage`], so the checksum
//! engine runs unchanged against any of them:
//!
//! - [`LocalStorage`] over `std::fs`
//! - [`ShareStorage`] over a network share, through a [`ShareClient`]
//!   such as [`MountedShareClient`]
//!
//! # Example
//!
//! ```rust,no_run
//! use treesum_storage::{Backend, Location, MountedShareClient, ShareStorage};
//!
//! let backend = match Location::parse("smb://nas/public/docs").unwrap() {
//!     Location::Local(path) => Backend::local(path),
//!     Location::Share(url) => {
//!         let client = MountedShareClient::new("/mnt/nas-public");
//!         Backend::share(ShareStorage::connect(url, None, Box::new(client)).unwrap())
//!     }
//! };
//! println!("Scanning {}", backend.root_entry().path());
//! ```

mod backend;
mod local;
mod mounted;
mod share;

pub use backend::{Backend, Location};
pub use local::LocalStorage;
pub use mounted::MountedShareClient;
pub use share::{
    SHARE_SCHEME, ShareClient, ShareClientError, ShareCredential, ShareDirEntry, ShareParseError,
    ShareStat, ShareStorage, ShareUrl,
};

// Re-export core types for convenience
pub use treesum_core::{Entry, EntryType, Storage, StorageError};

/// Map a `std::fs` file type to an entry type.
pub(crate) fn type_of(file_type: std::fs::FileType) -> EntryType {
    if file_type.is_file() {
        EntryType::File
    } else if file_type.is_dir() {
        EntryType::Directory
    } else {
        EntryType::Other
    }
}
