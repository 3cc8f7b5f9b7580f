//! Checksum configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::ChecksumError;

/// Default read chunk size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Default cumulative byte threshold for the size policy.
pub const DEFAULT_MAX_BATCH_BYTES: u64 = 8 * 1024 * 1024;

/// Supported digest algorithms.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (16 bytes).
    #[default]
    #[strum(to_string = "MD5")]
    Md5,
    /// SHA-1 (20 bytes).
    #[strum(to_string = "SHA-1", serialize = "sha1")]
    #[serde(alias = "sha-1")]
    Sha1,
    /// SHA-256 (32 bytes).
    #[strum(to_string = "SHA-256", serialize = "sha256")]
    #[serde(alias = "sha-256")]
    Sha256,
    /// BLAKE3 (32 bytes).
    #[strum(to_string = "BLAKE3")]
    Blake3,
}

impl HashAlgorithm {
    /// Parse an algorithm name such as `MD5`, `sha1` or `SHA-256`.
    pub fn parse(name: &str) -> Result<Self, ChecksumError> {
        name.trim()
            .parse()
            .map_err(|_| ChecksumError::UnsupportedAlgorithm {
                name: name.to_string(),
            })
    }

    /// Digest length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }

    /// Length of the rendered hex digest.
    pub fn hex_len(self) -> usize {
        self.output_len() * 2
    }
}

/// Cost function deciding whether a batch of files is hashed directly or
/// split into `branch_factor` smaller batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Execute directly while the batch holds at most `max_files` files.
    Count { max_files: usize },
    /// Execute directly when the batch is a single file or its files sum to
    /// at most `max_bytes`.
    Size { max_bytes: u64 },
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self::Size {
            max_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }
}

/// Configuration for a checksum scan.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ChecksumConfig {
    /// Digest algorithm.
    #[builder(default)]
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Chunk size for reads, in bytes.
    #[builder(default = "DEFAULT_BUFFER_SIZE")]
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// File batch splitting policy.
    #[builder(default)]
    #[serde(default)]
    pub split_policy: SplitPolicy,

    /// Number of groups an oversized file batch is split into.
    #[builder(default = "2")]
    #[serde(default = "default_branch_factor")]
    pub branch_factor: usize,

    /// Number of worker threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Files hashed between progress events.
    #[builder(default = "1000")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_branch_factor() -> usize {
    2
}

fn default_progress_interval() -> u64 {
    1000
}

fn check(buffer_size: usize, branch_factor: usize, policy: SplitPolicy) -> Result<(), String> {
    if buffer_size == 0 {
        return Err("Buffer size must be greater than zero".to_string());
    }
    if branch_factor < 2 {
        return Err(format!("Branch factor must be at least 2, got {branch_factor}"));
    }
    if let SplitPolicy::Count { max_files: 0 } = policy {
        return Err("Count threshold must be at least 1".to_string());
    }
    Ok(())
}

impl ChecksumConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check(
            self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE),
            self.branch_factor.unwrap_or(2),
            self.split_policy.unwrap_or_default(),
        )
    }
}

impl ChecksumConfig {
    /// Create a new config builder.
    pub fn builder() -> ChecksumConfigBuilder {
        ChecksumConfigBuilder::default()
    }

    /// Create a default config for the given algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            buffer_size: DEFAULT_BUFFER_SIZE,
            split_policy: SplitPolicy::default(),
            branch_factor: 2,
            threads: 0,
            progress_interval: 1000,
        }
    }

    /// Check a config that did not come through the builder (e.g. TOML).
    pub fn validate(&self) -> Result<(), ChecksumError> {
        check(self.buffer_size, self.branch_factor, self.split_policy)
            .map_err(|message| ChecksumError::InvalidConfig { message })
    }
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ChecksumConfig::builder()
            .algorithm(HashAlgorithm::Sha1)
            .buffer_size(1024usize)
            .split_policy(SplitPolicy::Count { max_files: 1 })
            .threads(4usize)
            .build()
            .unwrap();

        assert_eq!(config.algorithm, HashAlgorithm::Sha1);
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.branch_factor, 2);
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn test_config_builder_rejects_bad_values() {
        assert!(ChecksumConfig::builder().buffer_size(0usize).build().is_err());
        assert!(ChecksumConfig::builder().branch_factor(1usize).build().is_err());
        assert!(
            ChecksumConfig::builder()
                .split_policy(SplitPolicy::Count { max_files: 0 })
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = ChecksumConfig::default();
        assert_eq!(config.algorithm, HashAlgorithm::Md5);
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(
            config.split_policy,
            SplitPolicy::Size {
                max_bytes: DEFAULT_MAX_BATCH_BYTES
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!(HashAlgorithm::parse("MD5").unwrap(), HashAlgorithm::Md5);
        assert_eq!(HashAlgorithm::parse("md5").unwrap(), HashAlgorithm::Md5);
        assert_eq!(HashAlgorithm::parse("SHA-1").unwrap(), HashAlgorithm::Sha1);
        assert_eq!(HashAlgorithm::parse("sha1").unwrap(), HashAlgorithm::Sha1);
        assert_eq!(HashAlgorithm::parse("sha256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::parse("blake3").unwrap(), HashAlgorithm::Blake3);

        let err = HashAlgorithm::parse("crc32").unwrap_err();
        assert!(matches!(err, ChecksumError::UnsupportedAlgorithm { .. }));
    }

    #[test]
    fn test_algorithm_display_roundtrip() {
        use strum::IntoEnumIterator;

        for algorithm in HashAlgorithm::iter() {
            let name = algorithm.to_string();
            assert_eq!(HashAlgorithm::parse(&name).unwrap(), algorithm);
        }
        assert_eq!(HashAlgorithm::Sha1.to_string(), "SHA-1");
        assert_eq!(HashAlgorithm::Md5.hex_len(), 32);
    }
}
