//! Turning duplicates into copy-on-write clones.
//!
//! # Overview
//!
//! [`DedupExecutor`] walks the clusters produced by the duplicate finder.
//! For each cluster the first member is the canonical copy; every other
//! member is replaced by a clone of it through a [`Cloner`]. The default
//! [`ReflinkCloner`] uses the filesystem's block-sharing clone (APFS
//! `clonefile`, Btrfs/XFS `FICLONE`, ReFS block cloning).
//!
//! A failed clone is counted and the run moves on to the next member.
//! Nothing in this module aborts a run except a shutdown request.
//!
//! # Policies
//!
//! - **dry run**: report what would be cloned, touch nothing
//! - **verify**: compare canonical and target byte for byte first and skip
//!   the target on mismatch
//! - **force**: allow replacing a read-only target
//!
//! # Example
//!
//! ```no_run
//! use clonedupe::actions::{DedupExecutor, DedupOptions};
//! # let clusters = Vec::new();
//!
//! let options = DedupOptions { dry_run: true, ..Default::default() };
//! let result = DedupExecutor::new(options).execute(&clusters);
//! println!("would reclaim {} bytes", result.bytes_reclaimed);
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::verify::files_identical;
use crate::duplicates::Cluster;
use crate::progress::ProgressCallback;
use crate::scanner::Digest;

/// Error type for clone operations.
#[derive(Debug, Error)]
pub enum CloneError {
    /// The target is read-only and overwriting was not permitted.
    #[error("destination is read-only: {0} (use --force to replace it)")]
    DestinationReadOnly(PathBuf),

    /// The filesystem refused the clone (unsupported, cross-volume, ...).
    #[error("clone of {source_path} onto {target} failed: {source}")]
    Reflink {
        /// Canonical file
        source_path: PathBuf,
        /// File that was to be replaced
        target: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Inspecting or replacing the target failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl CloneError {
    /// The path the error concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::DestinationReadOnly(p) | Self::Io { path: p, .. } => p,
            Self::Reflink { target, .. } => target,
        }
    }
}

/// Replaces a file with a clone of another.
///
/// Implementations must leave `target` either fully replaced or untouched.
pub trait Cloner: Send + Sync {
    /// Replace `target`'s content with a clone of `source`.
    ///
    /// # Errors
    ///
    /// Any failure; the caller counts it and continues.
    fn clone_file(&self, source: &Path, target: &Path, overwrite: bool) -> Result<(), CloneError>;
}

/// [`Cloner`] backed by the filesystem's reflink support.
///
/// The clone is created next to the target under a temporary name, given
/// the target's owner, group and permission bits, and renamed over the
/// target.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReflinkCloner;

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh hidden name in the target's directory.
///
/// The name does not depend on the target's, so it fits wherever the
/// target's does.
fn temp_sibling(target: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!(".cdp-{}-{n}.tmp", std::process::id()))
}

/// Give `temp` the owner and group of the file it replaces.
///
/// A failed `chown` is only an error if ownership would actually change.
#[cfg(unix)]
fn copy_ownership(temp: &Path, target_meta: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::MetadataExt;

    let (uid, gid) = (target_meta.uid(), target_meta.gid());
    match std::os::unix::fs::chown(temp, Some(uid), Some(gid)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let temp_meta = fs::metadata(temp)?;
            if temp_meta.uid() == uid && temp_meta.gid() == gid {
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}

#[cfg(not(unix))]
fn copy_ownership(_temp: &Path, _target_meta: &fs::Metadata) -> io::Result<()> {
    Ok(())
}

impl Cloner for ReflinkCloner {
    fn clone_file(&self, source: &Path, target: &Path, overwrite: bool) -> Result<(), CloneError> {
        let target_meta = fs::metadata(target).map_err(|e| CloneError::Io {
            path: target.to_path_buf(),
            source: e,
        })?;
        let permissions = target_meta.permissions();
        if permissions.readonly() && !overwrite {
            return Err(CloneError::DestinationReadOnly(target.to_path_buf()));
        }

        let temp = temp_sibling(target);
        if let Err(e) = reflink_copy::reflink(source, &temp) {
            let _ = fs::remove_file(&temp);
            return Err(CloneError::Reflink {
                source_path: source.to_path_buf(),
                target: target.to_path_buf(),
                source: e,
            });
        }

        let finish = copy_ownership(&temp, &target_meta)
            .and_then(|()| fs::set_permissions(&temp, permissions))
            .and_then(|()| fs::rename(&temp, target));
        if let Err(e) = finish {
            let _ = fs::remove_file(&temp);
            return Err(CloneError::Io {
                path: target.to_path_buf(),
                source: e,
            });
        }

        Ok(())
    }
}

/// Switches controlling a dedup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupOptions {
    /// Report only, never modify files.
    pub dry_run: bool,
    /// Replace targets the cloner would otherwise refuse.
    pub force: bool,
    /// Compare canonical and target byte for byte before cloning.
    pub verify: bool,
}

/// What happened to one non-canonical member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum MemberOutcome {
    /// Replaced by a clone of the canonical file.
    Cloned,
    /// Dry run: would have been cloned.
    WouldClone,
    /// The clone failed; the file is unchanged.
    CloneFailed(String),
    /// Content no longer matches the canonical file; left alone.
    VerificationMismatch,
    /// Comparison could not be performed; left alone.
    VerifyFailed(String),
}

impl MemberOutcome {
    /// Whether this outcome counts as an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::CloneFailed(_) | Self::VerifyFailed(_))
    }
}

/// One member and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberReport {
    /// Member path
    pub path: PathBuf,
    /// What happened to it
    #[serde(flatten)]
    pub outcome: MemberOutcome,
}

/// Per-cluster record of a dedup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterReport {
    /// Full-content digest
    pub digest: Digest,
    /// File size in bytes
    pub size: u64,
    /// Clone source
    pub canonical: PathBuf,
    /// Non-canonical members in scan order
    pub members: Vec<MemberReport>,
}

/// Aggregate result of a dedup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupResult {
    /// Clusters started
    pub clusters_processed: usize,
    /// Combined size of all members of processed clusters
    pub bytes_total: u64,
    /// Size with one copy per processed cluster
    pub bytes_unique: u64,
    /// Size of members cloned (or that would be, in a dry run)
    pub bytes_reclaimed: u64,
    /// Members cloned (or that would be, in a dry run)
    pub files_cloned: usize,
    /// Members whose clone or comparison failed
    pub files_errored: usize,
    /// Members skipped because their content no longer matched
    pub files_verify_skipped: usize,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Whether the run stopped on a shutdown request
    pub interrupted: bool,
    /// Per-cluster outcomes
    pub clusters: Vec<ClusterReport>,
}

impl DedupResult {
    /// Bytes saved if every member were cloned successfully.
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.bytes_total.saturating_sub(self.bytes_unique)
    }

    /// Whether any member failed or was skipped by verification.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        self.files_errored > 0 || self.files_verify_skipped > 0
    }
}

/// Performs (or simulates) the clones for a list of clusters.
///
/// Clusters and their members are processed sequentially in order.
pub struct DedupExecutor {
    options: DedupOptions,
    cloner: Arc<dyn Cloner>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DedupExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupExecutor")
            .field("options", &self.options)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish_non_exhaustive()
    }
}

impl DedupExecutor {
    /// Create an executor that clones with [`ReflinkCloner`].
    #[must_use]
    pub fn new(options: DedupOptions) -> Self {
        Self {
            options,
            cloner: Arc::new(ReflinkCloner),
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Use a different clone primitive.
    #[must_use]
    pub fn with_cloner(mut self, cloner: Arc<dyn Cloner>) -> Self {
        self.cloner = cloner;
        self
    }

    /// Set the shutdown flag, checked between members.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> DedupOptions {
        self.options
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Process every cluster and return the tallies.
    ///
    /// The canonical member of each cluster is its first file.
    #[must_use]
    pub fn execute(&self, clusters: &[Cluster]) -> DedupResult {
        let mut result = DedupResult {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        let total: usize = clusters.iter().map(|c| c.duplicates().len()).sum();
        if let Some(ref progress) = self.progress {
            progress.on_phase_start("clone", total);
        }

        let mut done = 0usize;
        'clusters: for cluster in clusters {
            let Some(canonical) = cluster.files.first() else {
                continue;
            };

            if self.is_shutdown_requested() {
                result.interrupted = true;
                break;
            }

            result.clusters_processed += 1;
            result.bytes_total += cluster.total_size();
            result.bytes_unique += cluster.size;

            let mut report = ClusterReport {
                digest: cluster.digest.clone(),
                size: cluster.size,
                canonical: canonical.path.clone(),
                members: Vec::with_capacity(cluster.duplicates().len()),
            };

            for target in cluster.duplicates() {
                if self.is_shutdown_requested() {
                    log::debug!("Shutdown requested, stopping before {}", target.path.display());
                    result.interrupted = true;
                    result.clusters.push(report);
                    break 'clusters;
                }

                done += 1;
                if let Some(ref progress) = self.progress {
                    progress.on_progress(done, target.path.to_string_lossy().as_ref());
                }

                let outcome = self.process_member(&canonical.path, &target.path);
                match &outcome {
                    MemberOutcome::Cloned | MemberOutcome::WouldClone => {
                        result.files_cloned += 1;
                        result.bytes_reclaimed += cluster.size;
                        if let Some(ref progress) = self.progress {
                            progress.on_item_completed(cluster.size);
                        }
                    }
                    MemberOutcome::VerificationMismatch => result.files_verify_skipped += 1,
                    MemberOutcome::CloneFailed(_) | MemberOutcome::VerifyFailed(_) => {
                        result.files_errored += 1;
                    }
                }

                report.members.push(MemberReport {
                    path: target.path.clone(),
                    outcome,
                });
            }

            result.clusters.push(report);
        }

        if let Some(ref progress) = self.progress {
            progress.on_phase_end("clone");
        }

        log::info!(
            "{} {} file(s) in {} cluster(s), {} bytes, {} error(s), {} verification skip(s)",
            if self.options.dry_run { "Would clone" } else { "Cloned" },
            result.files_cloned,
            result.clusters_processed,
            result.bytes_reclaimed,
            result.files_errored,
            result.files_verify_skipped
        );

        result
    }

    /// Verify (if requested) and clone one member.
    fn process_member(&self, canonical: &Path, target: &Path) -> MemberOutcome {
        if self.options.verify {
            match files_identical(canonical, target) {
                Ok(true) => {}
                Ok(false) => {
                    log::info!(
                        "Verification mismatch, skipping {} (differs from {})",
                        target.display(),
                        canonical.display()
                    );
                    return MemberOutcome::VerificationMismatch;
                }
                Err(e) => {
                    log::warn!("Cannot compare {} with {}: {}", target.display(), canonical.display(), e);
                    return MemberOutcome::VerifyFailed(e.to_string());
                }
            }
        }

        if self.options.dry_run {
            log::debug!("Would clone {} → {}", canonical.display(), target.display());
            return MemberOutcome::WouldClone;
        }

        match self.cloner.clone_file(canonical, target, self.options.force) {
            Ok(()) => {
                log::debug!("Cloned {} → {}", canonical.display(), target.display());
                MemberOutcome::Cloned
            }
            Err(e) => {
                log::warn!("Clone failed: {}", e);
                MemberOutcome::CloneFailed(e.to_string())
            }
        }
    }
}
