//! Pattern expansion into file candidates.
//!
//! # Overview
//!
//! The [`Scanner`] turns a list of path patterns into the ordered list of
//! [`FileCandidate`]s that the duplicate finder works on. Each pattern is
//! enumerated with [`walkdir`], sorted by file name so the result is the
//! same from one run to the next. Scan order (pattern order, then
//! enumeration order) later decides which cluster member is canonical.
//!
//! # Filtering
//!
//! A match becomes a candidate only if it is:
//! - a regular file (directories, devices and symbolic links are skipped;
//!   links to directories are walked through, links to files are not
//!   candidates),
//! - at least `min_size` bytes,
//! - not a second path to an inode already seen (unless hardlinks are kept),
//! - not already produced by an earlier pattern.
//!
//! Entries whose metadata cannot be read, and directories that cannot be
//! listed, are dropped and counted in [`ScanStats`] along with a sample of
//! their error messages.
//!
//! # Example
//!
//! ```no_run
//! use clonedupe::scanner::{ScanConfig, Scanner};
//!
//! let scanner = Scanner::new(ScanConfig::default());
//! let (files, stats) = scanner.scan(&["/srv/media/**".to_string()]).unwrap();
//! println!("{} candidates ({} bytes)", files.len(), stats.candidate_bytes);
//! ```

use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use walkdir::WalkDir;

use super::hardlink::HardlinkTracker;
use super::pattern::PathPattern;
use super::{FileCandidate, ScanConfig, ScanError};
use crate::progress::ProgressCallback;

/// Counters collected while scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Paths produced by pattern expansion (before filtering)
    pub matched: usize,
    /// Paths accepted as candidates
    pub candidates: usize,
    /// Total size of all candidates
    pub candidate_bytes: u64,
    /// Regular files below the size threshold
    pub below_min_size: usize,
    /// Symbolic links skipped
    pub symlinks_skipped: usize,
    /// Devices, sockets, fifos and literal non-directory non-files
    pub non_regular_skipped: usize,
    /// Additional paths to an inode that was already accepted
    pub hardlinks_skipped: usize,
    /// Entries whose metadata could not be read
    pub size_query_failures: usize,
    /// Paths matched by more than one pattern (kept once)
    pub repeated_matches: usize,
    /// Directories that could not be enumerated
    pub walk_errors: usize,
    /// Messages of the first few size-query and walk errors
    pub error_samples: Vec<String>,
    /// Whether the scan stopped early on a shutdown request
    pub interrupted: bool,
}

/// Expands path patterns into file candidates.
pub struct Scanner {
    config: ScanConfig,
    cwd: Option<PathBuf>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("cwd", &self.cwd)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Error messages kept in [`ScanStats::error_samples`].
pub const MAX_ERROR_SAMPLES: usize = 16;

/// Mutable state shared across all patterns of one scan.
struct ScanState {
    candidates: Vec<FileCandidate>,
    seen: HashSet<PathBuf>,
    hardlinks: HardlinkTracker,
    stats: ScanStats,
}

impl ScanState {
    /// Count a skipped path and keep its message if there is room.
    fn record(&mut self, err: ScanError) {
        match err {
            ScanError::SizeQueryFailed { .. } => {
                log::debug!("{}", err);
                self.stats.size_query_failures += 1;
            }
            ScanError::Walk { .. } => {
                log::warn!("{}", err);
                self.stats.walk_errors += 1;
            }
            ScanError::NoPatterns | ScanError::InvalidPattern { .. } => {
                log::error!("{}", err);
            }
        }
        if self.stats.error_samples.len() < MAX_ERROR_SAMPLES {
            self.stats.error_samples.push(err.to_string());
        }
    }
}

impl Scanner {
    /// Create a scanner with the given filtering options.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            cwd: None,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Resolve relative patterns against `cwd` instead of the process
    /// working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag becomes `true` enumeration stops and the candidates
    /// found so far are returned.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report scan progress through `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The filtering options in use.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Parse every pattern, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// [`ScanError::NoPatterns`] for an empty list,
    /// [`ScanError::InvalidPattern`] for bad glob syntax.
    pub fn parse_patterns(&self, patterns: &[String]) -> Result<Vec<PathPattern>, ScanError> {
        if patterns.is_empty() {
            return Err(ScanError::NoPatterns);
        }
        patterns
            .iter()
            .map(|raw| match &self.cwd {
                Some(cwd) => PathPattern::parse_from(raw, cwd),
                None => PathPattern::parse(raw),
            })
            .collect()
    }

    /// Expand `patterns` into candidates in scan order.
    ///
    /// All patterns are validated before the filesystem is touched.
    ///
    /// # Errors
    ///
    /// Only misconfiguration fails the scan; see
    /// [`parse_patterns`](Self::parse_patterns).
    pub fn scan(&self, patterns: &[String]) -> Result<(Vec<FileCandidate>, ScanStats), ScanError> {
        let parsed = self.parse_patterns(patterns)?;

        if let Some(ref progress) = self.progress {
            progress.on_phase_start("scan", 0);
        }

        let mut state = ScanState {
            candidates: Vec::new(),
            seen: HashSet::new(),
            hardlinks: HardlinkTracker::new(),
            stats: ScanStats::default(),
        };

        for pattern in &parsed {
            if self.is_shutdown_requested() {
                log::debug!("Scanner: Shutdown requested, stopping before {}", pattern.raw());
                state.stats.interrupted = true;
                break;
            }
            log::debug!("Expanding pattern {}", pattern.absolute().display());
            self.expand(pattern, &mut state);
            if state.stats.interrupted {
                break;
            }
        }

        if let Some(ref progress) = self.progress {
            progress.on_phase_end("scan");
        }

        log::info!(
            "Scan complete: {} matches → {} candidates ({} below min size, {} symlinks, {} hardlinks skipped)",
            state.stats.matched,
            state.stats.candidates,
            state.stats.below_min_size,
            state.stats.symlinks_skipped,
            state.stats.hardlinks_skipped
        );

        Ok((state.candidates, state.stats))
    }

    /// Enumerate one pattern.
    ///
    /// Directory symlinks are followed, both at the base and at wildcard
    /// levels below it. Symlinks to anything else are still matched and
    /// then rejected by [`consider`](Self::consider).
    fn expand(&self, pattern: &PathPattern, state: &mut ScanState) {
        let base = pattern.base();

        let link_meta = match fs::symlink_metadata(base) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("Pattern {} matches nothing", pattern.raw());
                return;
            }
            Err(source) => {
                if pattern.is_literal() {
                    state.stats.matched += 1;
                    state.record(ScanError::SizeQueryFailed {
                        path: base.to_path_buf(),
                        source,
                    });
                } else {
                    state.record(ScanError::Walk {
                        path: base.to_path_buf(),
                        message: source.to_string(),
                    });
                }
                return;
            }
        };
        let base_is_dir = if link_meta.file_type().is_symlink() {
            fs::metadata(base).is_ok_and(|meta| meta.is_dir())
        } else {
            link_meta.is_dir()
        };

        // A literal non-directory (file, symlink, device) is its own only match.
        if pattern.is_literal() && !base_is_dir {
            self.consider(base.to_path_buf(), Ok(link_meta), state);
            return;
        }
        if !base_is_dir {
            return;
        }

        let include_hidden = self.config.include_hidden;
        let mut walker = WalkDir::new(base)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        if let Some(depth) = pattern.max_depth() {
            walker = walker.max_depth(depth);
        }

        let entries = walker
            .into_iter()
            .filter_entry(|entry| pattern.allows_hidden_in(entry.path(), include_hidden));

        for entry in entries {
            if self.is_shutdown_requested() {
                log::debug!("Scanner: Shutdown requested, stopping iteration");
                state.stats.interrupted = true;
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map_or_else(|| base.to_path_buf(), Path::to_path_buf);
                    // Dangling links fail to resolve; they are symlinks all the same.
                    if e.loop_ancestor().is_none()
                        && pattern.is_match(&path)
                        && pattern.allows_hidden_in(&path, include_hidden)
                    {
                        if let Ok(meta) = fs::symlink_metadata(&path) {
                            if meta.file_type().is_symlink() {
                                self.consider(path, Ok(meta), state);
                                continue;
                            }
                        }
                    }
                    state.record(ScanError::Walk {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }
            if !pattern.is_match(entry.path()) {
                continue;
            }

            let metadata = if entry.path_is_symlink() {
                fs::symlink_metadata(entry.path())
            } else {
                entry.metadata().map_err(io::Error::from)
            };
            self.consider(entry.into_path(), metadata, state);
        }
    }

    /// Apply the candidate filters to one matched path.
    fn consider(&self, path: PathBuf, metadata: io::Result<Metadata>, state: &mut ScanState) {
        state.stats.matched += 1;

        if state.seen.contains(&path) {
            log::trace!("Already matched: {}", path.display());
            state.stats.repeated_matches += 1;
            return;
        }

        let metadata = match metadata {
            Ok(meta) => meta,
            Err(source) => {
                state.record(ScanError::SizeQueryFailed { path, source });
                return;
            }
        };

        if metadata.file_type().is_symlink() {
            log::trace!("Skipping symlink: {}", path.display());
            state.stats.symlinks_skipped += 1;
            return;
        }
        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            state.stats.non_regular_skipped += 1;
            return;
        }

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!("Skipping small file ({} bytes): {}", size, path.display());
            state.stats.below_min_size += 1;
            return;
        }

        if self.config.skip_hardlinks && state.hardlinks.is_hardlink(&metadata) {
            log::debug!("Skipping hardlink: {}", path.display());
            state.stats.hardlinks_skipped += 1;
            return;
        }

        state.seen.insert(path.clone());
        state.stats.candidates += 1;
        state.stats.candidate_bytes += size;

        if let Some(ref progress) = self.progress {
            progress.on_progress(state.stats.candidates, &path.to_string_lossy());
            progress.on_item_completed(size);
        }

        state.candidates.push(FileCandidate::new(path, size));
    }
}
