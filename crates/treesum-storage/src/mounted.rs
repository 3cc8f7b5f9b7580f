//! Share client for shares already mounted by the operating system.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::share::{
    ShareClient, ShareClientError, ShareCredential, ShareDirEntry, ShareStat, ShareUrl,
};
use crate::type_of;

/// Serves a share through its local mount point (CIFS, NFS, ...).
///
/// Authentication belongs to the mount, so credentials passed to
/// [`ShareClient::connect`] are not used.
#[derive(Debug, Clone)]
pub struct MountedShareClient {
    mount_point: PathBuf,
}

impl MountedShareClient {
    /// Create a client for a share mounted at `mount_point`.
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            mount_point: mount_point.into(),
        }
    }

    /// The mount point.
    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn local_path(&self, path: &str) -> PathBuf {
        let mut local = self.mount_point.clone();
        local.extend(path.split('/').filter(|s| !s.is_empty()));
        local
    }
}

/// Map a local I/O error from a network mount to a client error.
fn from_io(err: io::Error) -> ShareClientError {
    use io::ErrorKind::*;

    match err.kind() {
        NotFound => ShareClientError::NotFound,
        PermissionDenied => ShareClientError::AccessDenied,
        NotConnected | TimedOut | ConnectionReset | ConnectionAborted | ConnectionRefused
        | BrokenPipe | HostUnreachable | NetworkUnreachable | NetworkDown
        | StaleNetworkFileHandle => ShareClientError::Connection {
            message: err.to_string(),
        },
        _ => ShareClientError::Io(err),
    }
}

impl ShareClient for MountedShareClient {
    fn connect(
        &self,
        share: &ShareUrl,
        _credential: Option<&ShareCredential>,
    ) -> Result<(), ShareClientError> {
        let target = self.local_path(share.path());
        debug!(share = %share, mount = %self.mount_point.display(), "Using mounted share");

        match fs::metadata(&self.mount_point) {
            Ok(m) if m.is_dir() => {}
            Ok(_) => {
                return Err(ShareClientError::Connection {
                    message: format!("{} is not a mount directory", self.mount_point.display()),
                });
            }
            Err(e) => {
                return Err(ShareClientError::Connection {
                    message: format!("share not mounted at {}: {e}", self.mount_point.display()),
                });
            }
        }
        fs::metadata(target).map(|_| ()).map_err(from_io)
    }

    fn stat(&self, path: &str) -> Result<ShareStat, ShareClientError> {
        let metadata = fs::metadata(self.local_path(path)).map_err(from_io)?;
        Ok(ShareStat {
            entry_type: type_of(metadata.file_type()),
            size: metadata.len(),
        })
    }

    fn read_dir(&self, path: &str) -> Result<Vec<ShareDirEntry>, ShareClientError> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(self.local_path(path)).map_err(from_io)? {
            let dir_entry = dir_entry.map_err(from_io)?;
            let entry_type = dir_entry
                .file_type()
                .ok()
                .filter(|ft| !ft.is_symlink())
                .map(type_of);
            entries.push(ShareDirEntry {
                name: dir_entry.file_name().to_string_lossy().into_owned(),
                entry_type,
            });
        }
        Ok(entries)
    }

    fn open<'a>(&'a self, path: &str) -> Result<Box<dyn Read + Send + 'a>, ShareClientError> {
        let file = File::open(self.local_path(path)).map_err(from_io)?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_path_mapping() {
        let client = MountedShareClient::new("/mnt/nas");
        assert_eq!(client.local_path(""), PathBuf::from("/mnt/nas"));
        assert_eq!(client.local_path("a/b.txt"), PathBuf::from("/mnt/nas/a/b.txt"));
    }

    #[test]
    fn test_connect_requires_mount() {
        let temp = TempDir::new().unwrap();
        let url = ShareUrl::parse("smb://nas/share").unwrap();

        let client = MountedShareClient::new(temp.path().join("missing"));
        assert!(matches!(
            client.connect(&url, None),
            Err(ShareClientError::Connection { .. })
        ));

        let client = MountedShareClient::new(temp.path());
        assert!(client.connect(&url, None).is_ok());
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            from_io(io::Error::from(io::ErrorKind::NotFound)),
            ShareClientError::NotFound
        ));
        assert!(matches!(
            from_io(io::Error::from(io::ErrorKind::ConnectionReset)),
            ShareClientError::Connection { .. }
        ));
        assert!(matches!(
            from_io(io::Error::from(io::ErrorKind::InvalidData)),
            ShareClientError::Io(_)
        ));
    }
}
