//! Reports for a finished run.
//!
//! A [`RunReport`] gathers everything a run produced. It is rendered either
//! as a human-readable listing ([`text::TextReport`]) or as a JSON document
//! ([`json::JsonReport`]).
//!
//! # Example
//!
//! ```no_run
//! use clonedupe::output::{text::TextReport, RunReport};
//!
//! # fn show(report: &RunReport) -> std::io::Result<()> {
//! let mut stdout = std::io::stdout().lock();
//! TextReport::new(1, false, true).render(&mut stdout, report)?;
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod text;

use serde::Serialize;

use crate::actions::DedupResult;
use crate::disk::DiskUsage;
use crate::duplicates::ClusterSummary;
use crate::error::ExitCode;
use crate::scanner::{HashAlgorithm, ScanStats};

pub use json::{JsonReport, JsonReportError};
pub use text::TextReport;

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Scanner counters
    pub scan: ScanStats,
    /// Clustering statistics
    pub summary: ClusterSummary,
    /// Clone outcomes
    pub result: DedupResult,
    /// Filesystem usage before cloning
    pub disk_before: Option<DiskUsage>,
    /// Filesystem usage after cloning
    pub disk_after: Option<DiskUsage>,
    /// Digest algorithm in use
    pub algorithm: HashAlgorithm,
    /// Exit status of the run
    pub exit_code: ExitCode,
}

impl RunReport {
    /// Bytes the filesystem gained between the two disk samples.
    ///
    /// `None` without both samples or if they come from different mounts.
    #[must_use]
    pub fn bytes_freed(&self) -> Option<i128> {
        let before = self.disk_before.as_ref()?;
        let after = self.disk_after.as_ref()?;
        if before.mount_point != after.mount_point {
            return None;
        }
        Some(i128::from(after.free) - i128::from(before.free))
    }
}
