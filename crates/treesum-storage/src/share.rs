//! Network share backend.
//!
//! [`ShareStorage`] adapts any [`ShareClient`] (the protocol seam) to the
//! [`Storage`] contract. Entry paths are full share URLs such as
//! `smb://nas/public/docs/report.pdf`; the client only ever sees the
//! share-relative part (`docs/report.pdf`, or `""` for the share root).

use std::fmt;
use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::debug;
use url::Url;

use treesum_core::{Entry, EntryType, Storage, StorageError};

/// URL scheme accepted for network shares.
pub const SHARE_SCHEME: &str = "smb";

/// Errors reported by a share protocol client.
#[derive(Debug, Error)]
pub enum ShareClientError {
    /// The server could not be reached or the session dropped.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// The server refused access.
    #[error("access denied")]
    AccessDenied,

    /// The path does not exist on the share.
    #[error("not found")]
    NotFound,

    /// Protocol-level failure with a server status code.
    #[error("protocol error {code}: {message}")]
    Protocol { code: i32, message: String },

    /// Local I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShareClientError {
    /// Translate into a [`StorageError`] for the given entry path.
    pub fn into_storage(self, path: impl Into<String>) -> StorageError {
        let path = path.into();
        match self {
            Self::Connection { message } => StorageError::Connection { path, message },
            Self::AccessDenied => StorageError::PermissionDenied { path },
            Self::NotFound => StorageError::NotFound { path },
            Self::Protocol { code, message } => StorageError::Io {
                path,
                source: std::io::Error::other(format!("protocol error {code}: {message}")),
            },
            Self::Io(source) => StorageError::io(path, source),
        }
    }
}

/// Errors parsing share locations and credentials.
#[derive(Debug, Error)]
pub enum ShareParseError {
    /// The URL is malformed or uses the wrong scheme.
    #[error("Invalid share URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The credential string is malformed.
    #[error("Invalid credential: {reason}")]
    InvalidCredential { reason: String },

    /// The credential file could not be read.
    #[error("Cannot read credential file {path}: {source}")]
    CredentialFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parsed `smb://host/share/path` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUrl {
    host: String,
    share: String,
    path: String,
}

impl ShareUrl {
    /// Parse a share URL. Percent-encoded segments are decoded.
    pub fn parse(input: &str) -> Result<Self, ShareParseError> {
        let invalid = |reason: &str| ShareParseError::InvalidUrl {
            url: input.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(input).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != SHARE_SCHEME {
            return Err(invalid(&format!("expected {SHARE_SCHEME}:// scheme")));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .to_string();

        let mut segments = Vec::new();
        for segment in url.path_segments().into_iter().flatten() {
            if segment.is_empty() {
                continue;
            }
            let decoded = urlencoding::decode(segment).map_err(|e| invalid(&e.to_string()))?;
            segments.push(decoded.into_owned());
        }

        let mut segments = segments.into_iter();
        let share = segments.next().ok_or_else(|| invalid("missing share name"))?;
        let path = segments.collect::<Vec<_>>().join("/");

        Ok(Self { host, share, path })
    }

    /// Server host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Share name.
    pub fn share(&self) -> &str {
        &self.share
    }

    /// Path inside the share, `/`-separated, empty for the share root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// URL of the share root, without a trailing separator.
    pub fn share_root(&self) -> String {
        format!("{SHARE_SCHEME}://{}/{}", self.host, self.share)
    }
}

impl fmt::Display for ShareUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.share_root())
        } else {
            write!(f, "{}/{}", self.share_root(), self.path)
        }
    }
}

/// Credential for a share in `[DOMAIN;]user[:password]` form.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareCredential {
    /// Optional authentication domain.
    pub domain: Option<String>,
    /// User name.
    pub username: String,
    /// Password (may be empty).
    pub password: String,
}

impl ShareCredential {
    /// Parse `[DOMAIN;]user[:password]`.
    pub fn parse(input: &str) -> Result<Self, ShareParseError> {
        let input = input.trim();
        let (domain, rest) = match input.split_once(';') {
            Some((domain, rest)) => (Some(domain.to_string()), rest),
            None => (None, input),
        };
        let (username, password) = rest.split_once(':').unwrap_or((rest, ""));

        if username.is_empty() {
            return Err(ShareParseError::InvalidCredential {
                reason: "missing user name".to_string(),
            });
        }

        Ok(Self {
            domain: domain.filter(|d| !d.is_empty()),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Read the credential from the first line of a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ShareParseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            ShareParseError::CredentialFile {
                path: path.display().to_string(),
                source,
            }
        })?;
        Self::parse(content.lines().next().unwrap_or_default())
    }
}

impl fmt::Debug for ShareCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareCredential")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Metadata for one share path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareStat {
    /// Entry type.
    pub entry_type: EntryType,
    /// Size in bytes (meaningful for files).
    pub size: u64,
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareDirEntry {
    /// Entry name, without separators.
    pub name: String,
    /// Type if the listing carried it.
    pub entry_type: Option<EntryType>,
}

/// Protocol client for a file-sharing server.
///
/// Paths are share-relative and `/`-separated; `""` is the share root.
pub trait ShareClient: Send + Sync {
    /// Establish the session for `share`.
    fn connect(
        &self,
        share: &ShareUrl,
        credential: Option<&ShareCredential>,
    ) -> Result<(), ShareClientError>;

    /// Stat a path.
    fn stat(&self, path: &str) -> Result<ShareStat, ShareClientError>;

    /// List a directory.
    fn read_dir(&self, path: &str) -> Result<Vec<ShareDirEntry>, ShareClientError>;

    /// Open a file for sequential reading.
    fn open<'a>(&'a self, path: &str) -> Result<Box<dyn Read + Send + 'a>, ShareClientError>;
}

/// Storage over a network share.
pub struct ShareStorage {
    url: ShareUrl,
    share_root: String,
    client: Box<dyn ShareClient>,
}

impl ShareStorage {
    /// Connect `client` to the share named by `url`.
    pub fn connect(
        url: ShareUrl,
        credential: Option<&ShareCredential>,
        client: Box<dyn ShareClient>,
    ) -> Result<Self, StorageError> {
        debug!(
            host = url.host(),
            share = url.share(),
            user = credential.map(|c| c.username.as_str()),
            "Connecting to share"
        );
        client
            .connect(&url, credential)
            .map_err(|e| e.into_storage(url.to_string()))?;

        let share_root = url.share_root();
        Ok(Self {
            url,
            share_root,
            client,
        })
    }

    /// Entry for the location the storage was opened with.
    pub fn root_entry(&self) -> Entry {
        Entry::new(self.url.to_string())
    }

    /// The share location.
    pub fn url(&self) -> &ShareUrl {
        &self.url
    }

    fn share_path<'p>(&self, entry: &'p Entry) -> &'p str {
        entry
            .path()
            .strip_prefix(self.share_root.as_str())
            .unwrap_or(entry.path())
            .trim_matches('/')
    }
}

impl fmt::Debug for ShareStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareStorage").field("url", &self.url).finish()
    }
}

impl Storage for ShareStorage {
    fn entry_type(&self, entry: &Entry) -> Result<EntryType, StorageError> {
        if let Some(hint) = entry.hint() {
            return Ok(hint);
        }
        self.client
            .stat(self.share_path(entry))
            .map(|stat| stat.entry_type)
            .map_err(|e| e.into_storage(entry.path()))
    }

    fn list_children(&self, entry: &Entry) -> Result<Vec<Entry>, StorageError> {
        let listing = self
            .client
            .read_dir(self.share_path(entry))
            .map_err(|e| e.into_storage(entry.path()))?;

        let parent = entry.path().trim_end_matches('/');
        Ok(listing
            .into_iter()
            .filter(|child| !matches!(child.name.as_str(), "" | "." | ".."))
            .map(|child| {
                let path = format!("{parent}/{}", child.name);
                match child.entry_type {
                    Some(entry_type) => Entry::with_type(path, entry_type),
                    None => Entry::new(path),
                }
            })
            .collect())
    }

    fn size(&self, entry: &Entry) -> Result<u64, StorageError> {
        self.client
            .stat(self.share_path(entry))
            .map(|stat| stat.size)
            .map_err(|e| e.into_storage(entry.path()))
    }

    fn open_read<'a>(&'a self, entry: &Entry) -> Result<Box<dyn Read + Send + 'a>, StorageError> {
        self.client
            .open(self.share_path(entry))
            .map_err(|e| e.into_storage(entry.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_share_url() {
        let url = ShareUrl::parse("smb://nas/The%20Files/Documents/Public/").unwrap();
        assert_eq!(url.host(), "nas");
        assert_eq!(url.share(), "The Files");
        assert_eq!(url.path(), "Documents/Public");
        assert_eq!(url.share_root(), "smb://nas/The Files");
        assert_eq!(url.to_string(), "smb://nas/The Files/Documents/Public");
    }

    #[test]
    fn test_parse_share_root_only() {
        let url = ShareUrl::parse("smb://server/public").unwrap();
        assert_eq!(url.path(), "");
        assert_eq!(url.to_string(), "smb://server/public");
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        assert!(ShareUrl::parse("http://server/share").is_err());
        assert!(ShareUrl::parse("smb://server/").is_err());
        assert!(ShareUrl::parse("not a url").is_err());
    }

    #[test]
    fn test_parse_credential() {
        let cred = ShareCredential::parse("WORKGROUP;alice:s3cret").unwrap();
        assert_eq!(cred.domain.as_deref(), Some("WORKGROUP"));
        assert_eq!(cred.username, "alice");
        assert_eq!(cred.password, "s3cret");

        let cred = ShareCredential::parse("bob").unwrap();
        assert!(cred.domain.is_none());
        assert_eq!(cred.password, "");

        assert!(ShareCredential::parse("DOMAIN;").is_err());
    }

    #[test]
    fn test_credential_debug_redacts_password() {
        let cred = ShareCredential::parse("alice:s3cret").unwrap();
        let debug = format!("{cred:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_client_error_translation() {
        let path = "smb://nas/share/a.txt";
        assert!(matches!(
            ShareClientError::AccessDenied.into_storage(path),
            StorageError::PermissionDenied { .. }
        ));
        assert!(matches!(
            ShareClientError::NotFound.into_storage(path),
            StorageError::NotFound { .. }
        ));
        let err = ShareClientError::Connection {
            message: "session expired".into(),
        }
        .into_storage(path);
        assert!(matches!(err, StorageError::Connection { .. }));
        assert_eq!(err.path(), path);

        let err = ShareClientError::Protocol {
            code: -5,
            message: "bad handle".into(),
        }
        .into_storage(path);
        assert!(err.to_string().contains("bad handle"));
    }
}
