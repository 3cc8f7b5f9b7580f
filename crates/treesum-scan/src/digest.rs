//! Streaming digest over chunked reads.

use std::io::{ErrorKind, Read};

use compact_str::CompactString;
use md5::Digest;

use treesum_core::{DigestError, HashAlgorithm, to_hex};

enum HashState {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl HashState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Md5(h) => Digest::update(h, bytes),
            Self::Sha1(h) => Digest::update(h, bytes),
            Self::Sha256(h) => Digest::update(h, bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Md5(h) => Digest::reset(h),
            Self::Sha1(h) => Digest::reset(h),
            Self::Sha256(h) => Digest::reset(h),
            Self::Blake3(h) => {
                h.reset();
            }
        }
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        match self {
            Self::Md5(h) => h.finalize_reset().to_vec(),
            Self::Sha1(h) => h.finalize_reset().to_vec(),
            Self::Sha256(h) => h.finalize_reset().to_vec(),
            Self::Blake3(h) => {
                let out = h.finalize().as_bytes().to_vec();
                h.reset();
                out
            }
        }
    }
}

/// Reusable hash state that digests byte streams in bounded chunks.
///
/// State is reset before every [`compute`](Self::compute), so one instance
/// can hash many files in sequence. It is not meant to be shared between
/// threads; each work unit owns its own.
pub struct StreamingDigest {
    algorithm: HashAlgorithm,
    state: HashState,
    buffer: Vec<u8>,
}

impl StreamingDigest {
    /// Create a digest for the given algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            state: HashState::new(algorithm),
            buffer: Vec::new(),
        }
    }

    /// Algorithm in use.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Read `reader` to the end in chunks of `chunk_size` bytes and return
    /// the finalized digest.
    pub fn compute<R: Read>(&mut self, mut reader: R, chunk_size: usize) -> Result<Vec<u8>, DigestError> {
        self.state.reset();
        self.buffer.resize(chunk_size.max(1), 0);

        let mut bytes_read = 0u64;
        loop {
            match reader.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => {
                    self.state.update(&self.buffer[..n]);
                    bytes_read += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    self.state.reset();
                    return Err(DigestError::Read { bytes_read, source });
                }
            }
        }

        Ok(self.state.finalize_reset())
    }

    /// Like [`compute`](Self::compute), rendered as lowercase hex.
    pub fn compute_hex<R: Read>(&mut self, reader: R, chunk_size: usize) -> Result<CompactString, DigestError> {
        self.compute(reader, chunk_size).map(|bytes| to_hex(&bytes))
    }
}

/// Digest an in-memory byte slice.
pub fn digest_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    let mut state = HashState::new(algorithm);
    state.update(data);
    state.finalize_reset()
}
