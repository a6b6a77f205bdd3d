//! Human-readable report.
//!
//! ```text
//! DRY RUN: no files were modified
//! Disk /: 40.0 KB free of 100.0 KB
//!
//! Hash:abababab... Size:2048 (2.0 KiB)
//!   > /data/a.bin
//!     /data/b.bin   would clone
//!     /data/c.bin   clone failed: Permission denied
//!
//! Clusters: 1  Total: 6144 (6.0 KiB)  Unique: 2048 (2.0 KiB)  Reclaimable: 4096 (4.0 KiB)
//! ```

use std::fmt::Display;
use std::io::{self, Write};

use yansi::{Color, Paint, Style};

use super::RunReport;
use crate::actions::{ClusterReport, MemberOutcome};
use crate::duplicates::{format_size, PhaseStats};

/// Renders a [`RunReport`] as text.
#[derive(Debug, Clone, Copy)]
pub struct TextReport {
    verbosity: u8,
    quiet: bool,
    color: bool,
}

impl TextReport {
    /// A renderer for the given `-v` count.
    ///
    /// `quiet` limits the output to the totals; `color` enables ANSI styling.
    #[must_use]
    pub fn new(verbosity: u8, quiet: bool, color: bool) -> Self {
        Self {
            verbosity,
            quiet,
            color,
        }
    }

    fn paint(&self, text: impl Display, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error from `out`.
    pub fn render<W: Write>(&self, out: &mut W, report: &RunReport) -> io::Result<()> {
        let result = &report.result;

        if !self.quiet {
            if result.dry_run {
                writeln!(
                    out,
                    "{}",
                    self.paint(
                        "DRY RUN: no files were modified",
                        Style::new().fg(Color::Yellow).bold()
                    )
                )?;
            }
            if let Some(ref disk) = report.disk_before {
                writeln!(
                    out,
                    "Disk {}: {} free of {}",
                    disk.mount_point.display(),
                    format_size(disk.free),
                    format_size(disk.total)
                )?;
            }

            for cluster in &result.clusters {
                writeln!(out)?;
                self.render_cluster(out, cluster)?;
            }

            if self.verbosity >= 1 {
                writeln!(out)?;
                self.render_phases(out, report)?;
            }
            writeln!(out)?;
        }

        self.render_totals(out, report)
    }

    fn render_cluster<W: Write>(&self, out: &mut W, cluster: &ClusterReport) -> io::Result<()> {
        writeln!(
            out,
            "{}:{} {}:{} ({})",
            self.paint("Hash", Style::new().bold()),
            cluster.digest,
            self.paint("Size", Style::new().bold()),
            cluster.size,
            format_size(cluster.size)
        )?;
        writeln!(
            out,
            "  {} {}",
            self.paint(">", Style::new().fg(Color::Green).bold()),
            cluster.canonical.display()
        )?;

        for member in &cluster.members {
            if self.verbosity == 0 {
                writeln!(out, "    {}", member.path.display())?;
                continue;
            }
            let (label, style) = match &member.outcome {
                MemberOutcome::Cloned => ("cloned".to_string(), Style::new().fg(Color::Green)),
                MemberOutcome::WouldClone => {
                    ("would clone".to_string(), Style::new().fg(Color::Cyan))
                }
                MemberOutcome::CloneFailed(reason) => {
                    (format!("clone failed: {reason}"), Style::new().fg(Color::Red))
                }
                MemberOutcome::VerificationMismatch => (
                    "skipped: content changed".to_string(),
                    Style::new().fg(Color::Yellow),
                ),
                MemberOutcome::VerifyFailed(reason) => {
                    (format!("verify failed: {reason}"), Style::new().fg(Color::Red))
                }
            };
            writeln!(
                out,
                "    {}   {}",
                member.path.display(),
                self.paint(label, style)
            )?;
        }
        Ok(())
    }

    fn render_phases<W: Write>(&self, out: &mut W, report: &RunReport) -> io::Result<()> {
        let scan = &report.scan;
        let summary = &report.summary;

        writeln!(
            out,
            "Scan: {} matched, {} candidates ({}), {} below minimum size, {} symlinks, {} hardlinks, {} other skipped",
            scan.matched,
            scan.candidates,
            format_size(scan.candidate_bytes),
            scan.below_min_size,
            scan.symlinks_skipped,
            scan.hardlinks_skipped,
            scan.non_regular_skipped + scan.size_query_failures + scan.walk_errors
        )?;
        if self.verbosity >= 2 {
            for message in &scan.error_samples {
                writeln!(out, "  skipped: {message}")?;
            }
        }
        writeln!(
            out,
            "Size phase: {} files, {} distinct sizes, {} eliminated, {} empty",
            summary.size_phase.total_files,
            summary.size_phase.unique_sizes,
            summary.size_phase.eliminated_unique,
            summary.size_phase.empty_files
        )?;
        self.render_phase(out, "Prefix phase", &summary.prefix_phase)?;
        self.render_phase(out, "Full phase", &summary.full_phase)?;
        writeln!(
            out,
            "Hash: {}, clustering took {:.2?}",
            report.algorithm, summary.duration
        )
    }

    fn render_phase<W: Write>(&self, out: &mut W, name: &str, stats: &PhaseStats) -> io::Result<()> {
        writeln!(
            out,
            "{name}: {} in, {} eliminated ({:.1}%), {} groups, {} unreadable",
            stats.input_files,
            stats.eliminated,
            stats.elimination_rate(),
            stats.groups,
            stats.failed_files()
        )?;
        if self.verbosity >= 2 {
            for path in &stats.unreadable {
                writeln!(out, "  unreadable: {}", path.display())?;
            }
        }
        Ok(())
    }

    fn render_totals<W: Write>(&self, out: &mut W, report: &RunReport) -> io::Result<()> {
        let result = &report.result;
        let sized = |bytes: u64| format!("{bytes} ({})", format_size(bytes));

        writeln!(
            out,
            "Clusters: {}  Total: {}  Unique: {}  Reclaimable: {}",
            result.clusters_processed,
            sized(result.bytes_total),
            sized(result.bytes_unique),
            sized(result.potential_savings())
        )?;

        let verb = if result.dry_run { "Would clone" } else { "Cloned" };
        writeln!(
            out,
            "{verb}: {} files, {}",
            result.files_cloned,
            self.paint(sized(result.bytes_reclaimed), Style::new().fg(Color::Green))
        )?;

        let errors = format!("Errors: {}", result.files_errored);
        let skipped = format!("Verification skips: {}", result.files_verify_skipped);
        writeln!(
            out,
            "{}  {}",
            if result.files_errored > 0 {
                self.paint(errors, Style::new().fg(Color::Red).bold())
            } else {
                errors
            },
            if result.files_verify_skipped > 0 {
                self.paint(skipped, Style::new().fg(Color::Yellow))
            } else {
                skipped
            }
        )?;

        if let Some(freed) = report.bytes_freed() {
            let after = report.disk_after.as_ref().map_or(0, |d| d.free);
            let amount = if freed >= 0 {
                format_size(freed.unsigned_abs() as u64)
            } else {
                format!("-{}", format_size(freed.unsigned_abs() as u64))
            };
            writeln!(out, "Freed: {amount} (now {} free)", format_size(after))?;
        }
        if result.interrupted {
            writeln!(
                out,
                "{}",
                self.paint("Interrupted: remaining clusters were not processed", Style::new().fg(Color::Yellow))
            )?;
        }
        Ok(())
    }
}
