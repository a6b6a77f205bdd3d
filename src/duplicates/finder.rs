//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Phase 1 - Size grouping**: Group files by size (see [`crate::duplicates::groups`] module)
//! 2. **Phase 2 - Prefix hash**: Hash the first 1 KiB of same-size files
//! 3. **Phase 3 - Full hash**: Hash the entire content of prefix matches
//!
//! Files that cannot be read during phases 2 and 3 are dropped from their
//! bucket and counted; they never fail the run.
//!
//! # Determinism
//!
//! Hashing may run on a bounded rayon pool, but results are collected in
//! input order and regrouped sequentially. Bucket membership, member order
//! and cluster order therefore never depend on which hash finished first.
//!
//! # Example
//!
//! ```no_run
//! use clonedupe::scanner::{Hasher, ScanConfig, Scanner};
//! use clonedupe::duplicates::{DuplicateFinder, FinderConfig};
//!
//! let (files, _) = Scanner::new(ScanConfig::default())
//!     .scan(&["/srv/media/**".to_string()])
//!     .unwrap();
//!
//! let finder = DuplicateFinder::new(Hasher::new(), FinderConfig::default());
//! let (clusters, summary) = finder.find_clusters(files).unwrap();
//!
//! println!("{} clusters, {} reclaimable", clusters.len(), summary.reclaimable_display());
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;
use serde::Serialize;

use super::groups::{group_by_size, Cluster, GroupingStats, PrefixBucket, SizeBucket};
use crate::progress::ProgressCallback;
use crate::scanner::{Digest, FileCandidate, HashError, HashMode, Hasher};

/// Configuration for the hashing phases.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of threads reading files concurrently.
    /// Default is 1 (sequential).
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 1,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from one hashing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseStats {
    /// Files that entered the phase
    pub input_files: usize,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Files that could not be read
    pub unreadable: Vec<PathBuf>,
    /// Files dropped as the only member of their digest
    pub eliminated: usize,
    /// Files left in groups of two or more
    pub potential_duplicates: usize,
    /// Groups of two or more
    pub groups: usize,
    /// Whether the phase stopped on a shutdown request
    pub interrupted: bool,
}

impl PhaseStats {
    /// Percentage of input files that did not survive the phase.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let dropped = self.input_files - self.potential_duplicates;
            (dropped as f64 / self.input_files as f64) * 100.0
        }
    }

    /// Number of files that could not be read.
    #[must_use]
    pub fn failed_files(&self) -> usize {
        self.unreadable.len()
    }
}

/// Result of hashing one file: `None` when skipped for shutdown.
type HashOutcome = (FileCandidate, Option<Result<Digest, HashError>>);

/// Hash every file, returning results in input order.
fn hash_in_order(
    files: Vec<FileCandidate>,
    hasher: &Hasher,
    mode: HashMode,
    config: &FinderConfig,
) -> Vec<HashOutcome> {
    // Workers finish out of order, so progress counts starts, not indices.
    let started = AtomicUsize::new(0);
    let hash_one = |file: FileCandidate| -> HashOutcome {
        if config.is_shutdown_requested() {
            return (file, None);
        }
        if let Some(ref callback) = config.progress_callback {
            let current = started.fetch_add(1, Ordering::Relaxed) + 1;
            callback.on_progress(current, file.path.to_string_lossy().as_ref());
        }
        let result = hasher.digest(&file.path, mode);
        match &result {
            Ok(digest) => {
                log::trace!("{:?} hash {} for {}", mode, digest, file.path.display());
                if let Some(ref callback) = config.progress_callback {
                    let bytes = match mode {
                        HashMode::Prefix => file.size.min(crate::scanner::PREFIX_SIZE as u64),
                        HashMode::Full => file.size,
                    };
                    callback.on_item_completed(bytes);
                }
            }
            Err(e) => log::warn!("Skipping unreadable file: {}", e),
        }
        (file, Some(result))
    };

    if config.io_threads <= 1 {
        return files.into_iter().map(hash_one).collect();
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads)
        .build()
    {
        Ok(pool) => pool.install(|| files.into_par_iter().map(hash_one).collect()),
        Err(e) => {
            log::warn!("Failed to create hashing thread pool ({}), hashing sequentially", e);
            files.into_iter().map(hash_one).collect()
        }
    }
}

/// Regroup hashed files by (size, digest), in order of first appearance.
///
/// Returns the groups of two or more and fills in `stats`.
fn regroup(
    outcomes: Vec<HashOutcome>,
    stats: &mut PhaseStats,
) -> Vec<(u64, Digest, Vec<FileCandidate>)> {
    let mut groups: Vec<(u64, Digest, Vec<FileCandidate>)> = Vec::new();
    let mut index: HashMap<(u64, Digest), usize> = HashMap::new();

    for (file, outcome) in outcomes {
        match outcome {
            None => stats.interrupted = true,
            Some(Err(e)) => stats.unreadable.push(e.path().to_path_buf()),
            Some(Ok(digest)) => {
                stats.hashed_files += 1;
                let key = (file.size, digest);
                match index.get(&key) {
                    Some(&slot) => groups[slot].2.push(file),
                    None => {
                        index.insert(key.clone(), groups.len());
                        groups.push((key.0, key.1, vec![file]));
                    }
                }
            }
        }
    }

    groups.retain(|(_, digest, files)| {
        if files.len() == 1 {
            stats.eliminated += 1;
            log::trace!(
                "Eliminated unique digest {}: {}",
                digest,
                files[0].path.display()
            );
            false
        } else {
            stats.potential_duplicates += files.len();
            stats.groups += 1;
            true
        }
    });

    groups
}

/// Group same-size files by prefix digest (Phase 2).
///
/// Buckets are keyed by (size, digest) so files of different sizes never
/// share a bucket even when their first bytes agree. Unreadable files are
/// dropped and listed in the returned stats.
#[must_use]
pub fn phase2_prefix(
    size_buckets: Vec<SizeBucket>,
    hasher: &Hasher,
    config: &FinderConfig,
) -> (Vec<PrefixBucket>, PhaseStats) {
    let files: Vec<FileCandidate> = size_buckets.into_iter().flat_map(|b| b.files).collect();
    let mut stats = PhaseStats {
        input_files: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        log::debug!("Phase 2: No files to process");
        return (Vec::new(), stats);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("prefix", files.len());
    }
    log::info!("Phase 2: Computing prefix hashes for {} files", files.len());

    let outcomes = hash_in_order(files, hasher, HashMode::Prefix, config);
    let buckets: Vec<PrefixBucket> = regroup(outcomes, &mut stats)
        .into_iter()
        .map(|(size, digest, files)| PrefixBucket {
            size,
            digest,
            files,
        })
        .collect();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("prefix");
    }

    log::info!(
        "Phase 2 complete: {} files → {} potential duplicates ({:.1}% eliminated, {} unreadable)",
        stats.input_files,
        stats.potential_duplicates,
        stats.elimination_rate(),
        stats.failed_files()
    );

    (buckets, stats)
}

/// Group prefix matches by full-content digest (Phase 3).
///
/// Every returned cluster has at least two members in scan order.
#[must_use]
pub fn phase3_full(
    prefix_buckets: Vec<PrefixBucket>,
    hasher: &Hasher,
    config: &FinderConfig,
) -> (Vec<Cluster>, PhaseStats) {
    let files: Vec<FileCandidate> = prefix_buckets.into_iter().flat_map(|b| b.files).collect();
    let mut stats = PhaseStats {
        input_files: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        log::debug!("Phase 3: No files to process");
        return (Vec::new(), stats);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("full", files.len());
    }
    log::info!("Phase 3: Computing full hashes for {} files", files.len());

    let outcomes = hash_in_order(files, hasher, HashMode::Full, config);
    let clusters: Vec<Cluster> = regroup(outcomes, &mut stats)
        .into_iter()
        .map(|(size, digest, files)| {
            log::debug!(
                "Cluster {}: {} files of {} bytes",
                digest,
                files.len(),
                size
            );
            Cluster {
                digest,
                size,
                files,
            }
        })
        .collect();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("full");
    }

    log::info!(
        "Phase 3 complete: {} files → {} clusters ({} unreadable)",
        stats.input_files,
        stats.groups,
        stats.failed_files()
    );

    (clusters, stats)
}

/// Summary statistics from a clustering run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterSummary {
    /// Candidates handed to the finder
    pub total_files: usize,
    /// Combined size of all candidates
    pub total_size: u64,
    /// Size phase statistics
    pub size_phase: GroupingStats,
    /// Prefix phase statistics
    pub prefix_phase: PhaseStats,
    /// Full phase statistics
    pub full_phase: PhaseStats,
    /// Number of clusters found
    pub clusters: usize,
    /// Files that would become clones (all members minus canonicals)
    pub duplicate_files: usize,
    /// Bytes saved if every duplicate becomes a clone
    pub reclaimable_bytes: u64,
    /// Wall-clock time of the three phases
    pub duration: Duration,
}

impl ClusterSummary {
    /// Files dropped because they could not be read.
    #[must_use]
    pub fn unreadable_files(&self) -> usize {
        self.prefix_phase.failed_files() + self.full_phase.failed_files()
    }

    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        format_size(self.reclaimable_bytes)
    }
}

/// Format a byte size as a human-readable string.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The run was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,
}

/// Runs the size, prefix and full phases over a candidate list.
///
/// # Example
///
/// ```no_run
/// use clonedupe::duplicates::{DuplicateFinder, FinderConfig};
/// use clonedupe::scanner::{HashAlgorithm, Hasher};
///
/// let hasher = Hasher::new().with_algorithm(HashAlgorithm::Blake3);
/// let finder = DuplicateFinder::new(hasher, FinderConfig::default().with_io_threads(4));
/// let (clusters, _) = finder.find_clusters(Vec::new()).unwrap();
/// assert!(clusters.is_empty());
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    hasher: Hasher,
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a finder using `hasher` for both hashing phases.
    #[must_use]
    pub fn new(hasher: Hasher, config: FinderConfig) -> Self {
        Self { hasher, config }
    }

    /// Create a finder with the default hasher and configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Hasher::new(), FinderConfig::default())
    }

    /// The hasher in use.
    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Reduce `candidates` to clusters of byte-identical files.
    ///
    /// Clusters come back ordered by the scan position of their canonical
    /// (first) member; members keep scan order.
    ///
    /// # Errors
    ///
    /// [`FinderError::Interrupted`] if the shutdown flag is raised.
    pub fn find_clusters(
        &self,
        candidates: Vec<FileCandidate>,
    ) -> Result<(Vec<Cluster>, ClusterSummary), FinderError> {
        let start = Instant::now();

        let scan_position: HashMap<PathBuf, usize> = candidates
            .iter()
            .enumerate()
            .map(|(idx, file)| (file.path.clone(), idx))
            .collect();

        let (size_buckets, size_stats) = group_by_size(candidates);
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (prefix_buckets, prefix_stats) =
            phase2_prefix(size_buckets, &self.hasher, &self.config);
        if prefix_stats.interrupted || self.config.is_shutdown_requested() {
            log::info!("Phase 2: Interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        let (mut clusters, full_stats) = phase3_full(prefix_buckets, &self.hasher, &self.config);
        if full_stats.interrupted || self.config.is_shutdown_requested() {
            log::info!("Phase 3: Interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        clusters.sort_by_key(|c| {
            scan_position
                .get(&c.canonical().path)
                .copied()
                .unwrap_or(usize::MAX)
        });

        let summary = ClusterSummary {
            total_files: size_stats.total_files,
            total_size: size_stats.total_size,
            clusters: clusters.len(),
            duplicate_files: clusters.iter().map(|c| c.duplicates().len()).sum(),
            reclaimable_bytes: clusters.iter().map(Cluster::reclaimable).sum(),
            size_phase: size_stats,
            prefix_phase: prefix_stats,
            full_phase: full_stats,
            duration: start.elapsed(),
        };

        log::info!(
            "Found {} clusters, {} reclaimable",
            summary.clusters,
            summary.reclaimable_display()
        );

        Ok((clusters, summary))
    }
}
