//! Streaming content hasher.
//!
//! # Overview
//!
//! The [`Hasher`] computes a content digest over either the first
//! [`PREFIX_SIZE`] bytes of a file or its entire content, reading the file
//! in fixed-size chunks. The hash algorithm and the chunk size are values
//! injected into the hasher, not process-wide settings.
//!
//! # Collision Risk
//!
//! The default algorithm is SHA-1 (160-bit digest). Two files are treated as
//! identical when their full-content digests match; the probability of an
//! accidental collision at this width is negligible for any realistic file
//! population. Deliberately crafted SHA-1 collisions are possible, so the
//! executor offers a byte-for-byte verification pass before cloning, and
//! SHA-256 or BLAKE3 can be selected instead.
//!
//! # Example
//!
//! ```no_run
//! use clonedupe::scanner::{HashAlgorithm, HashMode, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_algorithm(HashAlgorithm::Blake3);
//! let prefix = hasher.digest(Path::new("movie.mkv"), HashMode::Prefix).unwrap();
//! let full = hasher.digest(Path::new("movie.mkv"), HashMode::Full).unwrap();
//! println!("{prefix} {full}");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::HashError;

/// Number of leading bytes digested in prefix mode.
pub const PREFIX_SIZE: usize = 1024;

/// Default read chunk size for full-content hashing (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Hash function used for content digests.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, 160-bit digest
    #[default]
    Sha1,
    /// SHA-256, 256-bit digest
    Sha256,
    /// BLAKE3, 256-bit digest
    Blake3,
}

impl HashAlgorithm {
    /// Digest width in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Which part of the file to digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    /// Only the first [`PREFIX_SIZE`] bytes.
    Prefix,
    /// The entire content.
    Full,
}

/// A content digest.
///
/// Equality and hashing are over the raw digest bytes; `Display` renders
/// lowercase hexadecimal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Box<[u8]>);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hexadecimal form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Incremental state for one digest computation.
enum DigestState {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Sha1(h) => Digest::from_bytes(&h.finalize()),
            Self::Sha256(h) => Digest::from_bytes(&h.finalize()),
            Self::Blake3(h) => Digest::from_bytes(h.finalize().as_bytes()),
        }
    }
}

/// Streaming file hasher.
///
/// Cheap to clone and safe to share across threads; every call opens the
/// file afresh and has no side effects beyond reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a SHA-1 hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Use a different hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size for full hashing (minimum 1 byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Digest a file in the given mode.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Unreadable`] if the file cannot be opened or a
    /// read fails part-way. Callers exclude such files rather than abort.
    pub fn digest(&self, path: &Path, mode: HashMode) -> Result<Digest, HashError> {
        let unreadable = |source: io::Error| HashError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unreadable)?;
        let mut state = DigestState::new(self.algorithm);

        match mode {
            HashMode::Prefix => {
                let mut head = Vec::with_capacity(PREFIX_SIZE);
                file.take(PREFIX_SIZE as u64)
                    .read_to_end(&mut head)
                    .map_err(unreadable)?;
                state.update(&head);
            }
            HashMode::Full => {
                let mut reader = file;
                let mut buffer = vec![0u8; self.chunk_size];
                loop {
                    let n = match reader.read(&mut buffer) {
                        Ok(0) => break,
                        Ok(n) => n,
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(unreadable(e)),
                    };
                    state.update(&buffer[..n]);
                }
            }
        }

        Ok(state.finalize())
    }

    /// Digest of the first [`PREFIX_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// See [`Hasher::digest`].
    pub fn prefix_hash(&self, path: &Path) -> Result<Digest, HashError> {
        self.digest(path, HashMode::Prefix)
    }

    /// Digest of the entire content.
    ///
    /// # Errors
    ///
    /// See [`Hasher::digest`].
    pub fn full_hash(&self, path: &Path) -> Result<Digest, HashError> {
        self.digest(path, HashMode::Full)
    }
}
