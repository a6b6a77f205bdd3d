//! JSON report for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2026-01-01T12:00:00Z",
//!   "dry_run": false,
//!   "algorithm": "sha1",
//!   "clusters": [
//!     {
//!       "digest": "abab...",
//!       "size": 2048,
//!       "canonical": "/data/a.bin",
//!       "members": [
//!         { "path": "/data/b.bin", "status": "cloned" },
//!         { "path": "/data/c.bin", "status": "clone_failed", "reason": "Permission denied" }
//!       ]
//!     }
//!   ],
//!   "totals": {
//!     "clusters": 1,
//!     "bytes_total": 6144,
//!     "bytes_unique": 2048,
//!     "potential_savings": 4096,
//!     "bytes_reclaimed": 2048,
//!     "files_cloned": 1,
//!     "files_errored": 1,
//!     "files_verify_skipped": 0,
//!     "interrupted": false
//!   },
//!   "scan": { "...": "scanner counters" },
//!   "phases": { "...": "size, prefix and full phase statistics" },
//!   "disk_before": { "mount_point": "/", "total": 100000, "used": 60000, "free": 40000 },
//!   "disk_after": { "mount_point": "/", "total": 100000, "used": 57952, "free": 42048 },
//!   "exit_code": 3,
//!   "exit_code_name": "CD003"
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::RunReport;
use crate::actions::ClusterReport;
use crate::disk::DiskUsage;
use crate::duplicates::{GroupingStats, PhaseStats};
use crate::scanner::{HashAlgorithm, ScanStats};

/// Aggregate counters.
#[derive(Debug, Clone, Serialize)]
pub struct JsonTotals {
    /// Clusters processed
    pub clusters: usize,
    /// Combined size of all cluster members
    pub bytes_total: u64,
    /// Size with one copy per cluster
    pub bytes_unique: u64,
    /// `bytes_total - bytes_unique`
    pub potential_savings: u64,
    /// Size of members cloned (or that would be)
    pub bytes_reclaimed: u64,
    /// Members cloned (or that would be)
    pub files_cloned: usize,
    /// Members that failed
    pub files_errored: usize,
    /// Members skipped by verification
    pub files_verify_skipped: usize,
    /// Whether the run stopped early
    pub interrupted: bool,
}

/// Per-phase statistics.
#[derive(Debug, Clone, Serialize)]
pub struct JsonPhases<'a> {
    /// Size grouping
    pub size: &'a GroupingStats,
    /// Prefix hashing
    pub prefix: &'a PhaseStats,
    /// Full hashing
    pub full: &'a PhaseStats,
    /// Clustering wall-clock time in milliseconds
    pub duration_ms: u64,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Clusters with member outcomes
    pub clusters: &'a [ClusterReport],
    /// Aggregate counters
    pub totals: JsonTotals,
    /// Scanner counters
    pub scan: &'a ScanStats,
    /// Phase statistics
    pub phases: JsonPhases<'a>,
    /// Disk usage before cloning
    pub disk_before: Option<&'a DiskUsage>,
    /// Disk usage after cloning
    pub disk_after: Option<&'a DiskUsage>,
    /// Numeric exit code
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g., "CD000")
    pub exit_code_name: &'static str,
}

impl<'a> JsonReport<'a> {
    /// Build the document for `report`, stamped with the current time.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self::with_timestamp(report, Utc::now())
    }

    /// Build the document with an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(report: &'a RunReport, generated_at: DateTime<Utc>) -> Self {
        let result = &report.result;
        Self {
            generated_at,
            dry_run: result.dry_run,
            algorithm: report.algorithm,
            clusters: &result.clusters,
            totals: JsonTotals {
                clusters: result.clusters_processed,
                bytes_total: result.bytes_total,
                bytes_unique: result.bytes_unique,
                potential_savings: result.potential_savings(),
                bytes_reclaimed: result.bytes_reclaimed,
                files_cloned: result.files_cloned,
                files_errored: result.files_errored,
                files_verify_skipped: result.files_verify_skipped,
                interrupted: result.interrupted,
            },
            scan: &report.scan,
            phases: JsonPhases {
                size: &report.summary.size_phase,
                prefix: &report.summary.prefix_phase,
                full: &report.summary.full_phase,
                duration_ms: report.summary.duration.as_millis() as u64,
            },
            disk_before: report.disk_before.as_ref(),
            disk_after: report.disk_after.as_ref(),
            exit_code: report.exit_code.as_i32(),
            exit_code_name: report.exit_code.code_prefix(),
        }
    }

    /// Serialize to a pretty-printed string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonReportError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur while writing the JSON report.
#[derive(thiserror::Error, Debug)]
pub enum JsonReportError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error writing JSON report: {0}")]
    Io(#[from] std::io::Error),
}
