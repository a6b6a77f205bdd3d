//! Scanner module for pattern expansion and file hashing.
//!
//! This module provides functionality for:
//! - Expanding path patterns (including recursive `**` wildcards)
//! - Filtering to regular, non-symlink files above a size threshold
//! - Content hashing over a prefix or the whole file
//! - Hardlink detection
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`pattern`]: Glob pattern parsing and matching
//! - [`walker`]: The [`Scanner`] that turns patterns into [`FileCandidate`]s
//! - [`hasher`]: Streaming digests (SHA-1 by default)
//! - [`hardlink`]: Inode tracking
//! - [`path_utils`]: Lexical path normalisation
//!
//! # Example
//!
//! ```no_run
//! use clonedupe::scanner::{ScanConfig, Scanner};
//!
//! let config = ScanConfig {
//!     min_size: 4096,
//!     ..Default::default()
//! };
//!
//! let scanner = Scanner::new(config);
//! let (candidates, stats) = scanner.scan(&["/home/user/Pictures/**/*.jpg".to_string()]).unwrap();
//! println!("{} candidates, {} symlinks skipped", candidates.len(), stats.symlinks_skipped);
//! ```

pub mod hardlink;
pub mod hasher;
pub mod path_utils;
pub mod pattern;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::Serialize;

// Re-export main types
pub use hasher::{Digest, HashAlgorithm, HashMode, Hasher, DEFAULT_CHUNK_SIZE, PREFIX_SIZE};
pub use pattern::PathPattern;
pub use walker::{ScanStats, Scanner};

/// Files smaller than this are not worth cloning.
pub const DEFAULT_MIN_SIZE: u64 = 1024;

/// A regular file eligible for duplicate detection.
///
/// Created by the scanner and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileCandidate {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Directory containing the file
    pub dir: PathBuf,
}

impl FileCandidate {
    /// Create a new FileCandidate.
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute path to the file
    /// * `size` - File size in bytes
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        let dir = path
            .parent()
            .map_or_else(|| path.clone(), Path::to_path_buf);
        Self { path, size, dir }
    }
}

/// Configuration for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Minimum file size to include (in bytes).
    pub min_size: u64,

    /// Let wildcards match dot-prefixed names.
    pub include_hidden: bool,

    /// Drop second and later paths to an already-seen inode.
    pub skip_hardlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            include_hidden: false,
            skip_hardlinks: true,
        }
    }
}

/// Errors that can occur while scanning.
///
/// Only [`ScanError::NoPatterns`] and [`ScanError::InvalidPattern`] stop a
/// scan; the others are recorded and the offending path is dropped.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// No patterns were supplied.
    #[error("No paths to scan")]
    NoPatterns,

    /// A pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as given
        pattern: String,
        /// Parser message
        message: String,
    },

    /// The size of a matched path could not be queried.
    #[error("Cannot query size of {path}: {source}")]
    SizeQueryFailed {
        /// Path that could not be inspected
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be enumerated.
    #[error("Walk error for {path}: {message}")]
    Walk {
        /// Path where enumeration failed
        path: PathBuf,
        /// Error message
        message: String,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file could not be opened or read.
    #[error("Unreadable file {path}: {source}")]
    Unreadable {
        /// Path that could not be read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Unreadable { path, .. } => path,
        }
    }
}
