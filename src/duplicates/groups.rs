//! Bucket and cluster types, plus size grouping.
//!
//! # Overview
//!
//! Duplicate detection narrows candidates through three kinds of bucket:
//!
//! 1. [`SizeBucket`] - files of one exact size
//! 2. [`PrefixBucket`] - files of one size sharing a prefix digest
//! 3. [`Cluster`] - files sharing a full-content digest
//!
//! Every bucket keeps its members in scan order. Buckets are produced in
//! order of their first member, so the whole pipeline is deterministic.
//!
//! ## Size Grouping (Phase 1)
//!
//! Files with different sizes cannot be duplicates, so grouping by size
//! discards most of the candidates without reading a single byte.
//!
//! # Example
//!
//! ```
//! use clonedupe::scanner::FileCandidate;
//! use clonedupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileCandidate::new(PathBuf::from("/a.bin"), 2048),
//!     FileCandidate::new(PathBuf::from("/b.bin"), 2048),
//!     FileCandidate::new(PathBuf::from("/c.bin"), 4096),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! assert_eq!(buckets[0].size, 2048);
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::scanner::{Digest, FileCandidate};

/// Files sharing one exact size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// File size in bytes (shared by all members)
    pub size: u64,
    /// Members in scan order
    pub files: Vec<FileCandidate>,
}

impl SizeBucket {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the bucket has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Files of one size sharing the digest of their first bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixBucket {
    /// File size in bytes (inherited from the size bucket)
    pub size: u64,
    /// Digest of the first [`PREFIX_SIZE`](crate::scanner::PREFIX_SIZE) bytes
    pub digest: Digest,
    /// Members in scan order
    pub files: Vec<FileCandidate>,
}

impl PrefixBucket {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the bucket has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Files proven identical by full-content digest.
///
/// Always holds at least two members. The first member is canonical: it is
/// the file that was scanned first, and every other member becomes a clone
/// of it. This is a plain first-seen rule, not age or name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// Full-content digest
    pub digest: Digest,
    /// File size in bytes
    pub size: u64,
    /// Members in scan order
    pub files: Vec<FileCandidate>,
}

impl Cluster {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The clone source.
    ///
    /// # Panics
    ///
    /// Never for clusters produced by the finder, which always hold two or
    /// more files.
    #[must_use]
    pub fn canonical(&self) -> &FileCandidate {
        &self.files[0]
    }

    /// Members that would become clones of the canonical file.
    #[must_use]
    pub fn duplicates(&self) -> &[FileCandidate] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Combined size of all members.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Bytes saved if every duplicate becomes a clone.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.size * self.duplicates().len() as u64
    }

    /// Digest as lowercase hexadecimal.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        self.digest.to_hex()
    }

    /// Whether `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Files left in buckets of two or more
    pub potential_duplicates: usize,
    /// Files dropped as the only one of their size
    pub eliminated_unique: usize,
    /// Zero-length files (never clustered)
    pub empty_files: usize,
    /// Buckets of two or more
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by exact size (Phase 1 of duplicate detection).
///
/// Buckets with a single member are dropped. The returned buckets are in
/// order of their first member, and members keep their input order.
/// Zero-length files are counted and dropped: there is nothing to reclaim.
///
/// No file I/O is performed.
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileCandidate>,
) -> (Vec<SizeBucket>, GroupingStats) {
    let mut buckets: Vec<SizeBucket> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;

        if file.size == 0 {
            stats.empty_files += 1;
            log::debug!("Empty file encountered: {}", file.path.display());
            continue;
        }

        let slot = *index.entry(file.size).or_insert_with(|| {
            buckets.push(SizeBucket {
                size: file.size,
                files: Vec::new(),
            });
            buckets.len() - 1
        });
        buckets[slot].files.push(file);
    }

    if stats.empty_files > 0 {
        log::debug!("Skipped {} empty file(s)", stats.empty_files);
    }

    stats.unique_sizes = buckets.len();

    buckets.retain(|bucket| {
        if bucket.files.len() == 1 {
            stats.eliminated_unique += 1;
            log::trace!(
                "Eliminated unique size {}: {}",
                bucket.size,
                bucket.files[0].path.display()
            );
            false
        } else {
            stats.potential_duplicates += bucket.files.len();
            stats.duplicate_groups += 1;
            log::debug!(
                "Size group {} bytes: {} potential duplicates",
                bucket.size,
                bucket.files.len()
            );
            true
        }
    });

    log::info!(
        "Phase 1 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (buckets, stats)
}
