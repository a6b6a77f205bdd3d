//! Hardlink detection.
//!
//! Two directory entries that point at the same inode already share their
//! storage. Cloning one onto the other would only split the link, so the
//! scanner keeps the first path it sees for an inode and drops the rest.
//!
//! # Platform Support
//!
//! - **Unix**: (device id, inode) pairs from file metadata
//! - **Other**: detection disabled, every file is treated as distinct
//!
//! # Example
//!
//! ```no_run
//! use clonedupe::scanner::hardlink::HardlinkTracker;
//!
//! let mut tracker = HardlinkTracker::new();
//! let meta = std::fs::symlink_metadata("/data/a.bin").unwrap();
//! if tracker.is_hardlink(&meta) {
//!     println!("already seen this inode");
//! }
//! ```

use std::collections::HashSet;
use std::fs::Metadata;

/// Remembers which inodes have been seen during a scan.
///
/// Not thread-safe; the scanner owns one per run.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    seen: HashSet<InodeKey>,
}

impl HardlinkTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Record `metadata` and report whether its inode was seen before.
    ///
    /// Always `false` where inode identity is unavailable.
    pub fn is_hardlink(&mut self, metadata: &Metadata) -> bool {
        match InodeKey::from_metadata(metadata) {
            Some(key) => !self.seen.insert(key),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}
