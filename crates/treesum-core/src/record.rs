//! Checksum record type.

use std::fmt;
use std::fmt::Write as _;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Checksum of one file, relative to the scanned root.
///
/// Equality and hashing are structural over all three fields, so records
/// can be deduplicated in a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecksumRecord {
    /// Path relative to the root, `/`-separated, no leading separator.
    pub relative_path: CompactString,
    /// Size in bytes when the file was read.
    pub file_size: u64,
    /// Lowercase hex digest.
    pub digest: CompactString,
}

impl ChecksumRecord {
    /// Create a record from an already rendered hex digest.
    pub fn new(
        relative_path: impl Into<CompactString>,
        file_size: u64,
        digest: impl Into<CompactString>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            file_size,
            digest: digest.into(),
        }
    }

    /// Create a record from raw digest bytes.
    pub fn from_digest(relative_path: impl Into<CompactString>, file_size: u64, digest: &[u8]) -> Self {
        Self::new(relative_path, file_size, to_hex(digest))
    }
}

impl fmt::Display for ChecksumRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Render bytes as lowercase hex, two zero-padded characters per byte.
pub fn to_hex(bytes: &[u8]) -> CompactString {
    let mut out = CompactString::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing into a CompactString cannot fail.
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Derive the relative path of `path` under `root`.
///
/// Strips the root prefix, drops any leading `/` or `\`, and normalizes the
/// remaining separators to `/`. A path outside the root is kept whole.
pub fn relative_path(root: &str, path: &str) -> CompactString {
    let rest = path.strip_prefix(root).unwrap_or(path);
    let rest = rest.trim_start_matches(['/', '\\']);
    CompactString::from(rest.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_to_hex_pads() {
        assert_eq!(to_hex(&[0x0a]), "0a");
        assert_eq!(to_hex(&[0x00, 0xff, 0x10]), "00ff10");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("/data", "/data/a.txt"), "a.txt");
        assert_eq!(relative_path("/data/", "/data/sub/b.txt"), "sub/b.txt");
        assert_eq!(relative_path("C:\\data", "C:\\data\\sub\\b.txt"), "sub/b.txt");
        assert_eq!(
            relative_path("smb://nas/share/docs", "smb://nas/share/docs/x/y.pdf"),
            "x/y.pdf"
        );
    }

    #[test]
    fn test_record_equality_dedups() {
        let a = ChecksumRecord::new("a.txt", 5, "5d41402abc4b2a76b9719d911017c592");
        let b = ChecksumRecord::from_digest(
            "a.txt",
            5,
            &[
                0x5d, 0x41, 0x40, 0x2a, 0xbc, 0x4b, 0x2a, 0x76, 0xb9, 0x71, 0x9d, 0x91, 0x10, 0x17,
                0xc5, 0x92,
            ],
        );
        assert_eq!(a, b);

        let set: HashSet<_> = [a.clone(), b, ChecksumRecord::new("a.txt", 6, a.digest.clone())]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_record_json_field_names() {
        let record = ChecksumRecord::new("sub/b.txt", 0, "d41d8cd98f00b204e9800998ecf8427e");
        let json = record.to_string();
        assert_eq!(
            json,
            r#"{"relativePath":"sub/b.txt","fileSize":0,"digest":"d41d8cd98f00b204e9800998ecf8427e"}"#
        );
        let back: ChecksumRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
