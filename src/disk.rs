//! Disk usage of the filesystem holding the scanned files.
//!
//! Shown before and after a run so the effect of cloning is visible. The
//! numbers come from `sysinfo` and are for display only.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::Disks;

/// Space on one mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    /// Where the filesystem is mounted
    pub mount_point: PathBuf,
    /// Capacity in bytes
    pub total: u64,
    /// Bytes in use
    pub used: u64,
    /// Bytes available
    pub free: u64,
}

impl DiskUsage {
    fn new(mount_point: PathBuf, total: u64, free: u64) -> Self {
        Self {
            mount_point,
            total,
            used: total.saturating_sub(free),
            free,
        }
    }
}

/// Usage of the filesystem `path` lives on.
///
/// `None` if no mounted filesystem contains `path`.
#[must_use]
pub fn disk_usage(path: &Path) -> Option<DiskUsage> {
    let disks = Disks::new_with_refreshed_list();
    let mounts: Vec<(PathBuf, u64, u64)> = disks
        .list()
        .iter()
        .map(|d| (d.mount_point().to_path_buf(), d.total_space(), d.available_space()))
        .collect();

    let index = select_mount(mounts.iter().map(|(mount, _, _)| mount.as_path()), path)?;
    let (mount_point, total, free) = mounts.into_iter().nth(index)?;
    log::trace!("{} is on {}", path.display(), mount_point.display());
    Some(DiskUsage::new(mount_point, total, free))
}

/// Index of the mount point that is the longest prefix of `path`.
fn select_mount<'a>(mounts: impl IntoIterator<Item = &'a Path>, path: &Path) -> Option<usize> {
    mounts
        .into_iter()
        .enumerate()
        .filter(|(_, mount)| path.starts_with(mount))
        .max_by_key(|(_, mount)| mount.components().count())
        .map(|(index, _)| index)
}
