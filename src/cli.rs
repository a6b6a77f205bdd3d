//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # See what would be reclaimed, touching nothing
//! clonedupe --dry-run ~/Pictures/**/*.jpg
//!
//! # Clone duplicates, comparing bytes before each clone
//! clonedupe --verify /Volumes/Data/Projects
//!
//! # Machine-readable report
//! clonedupe --output json --min-size 1MiB '/srv/media/**'
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::scanner::HashAlgorithm;

/// Reclaim disk space by turning duplicate files into copy-on-write clones.
///
/// Files matched by the given patterns are grouped by size, then by a
/// digest of their first KiB, then by a digest of their full content.
/// Within each group of identical files the first one scanned is kept and
/// every other one is replaced by a clone of it, sharing its blocks on
/// filesystems that support it (APFS, Btrfs, XFS, ReFS).
#[derive(Debug, Parser)]
#[command(name = "clonedupe")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Files, directories or glob patterns to scan (`**` spans directories)
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Report what would be cloned without modifying anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Replace read-only duplicates too
    #[arg(short, long)]
    pub force: bool,

    /// Compare each duplicate byte for byte with its original before cloning
    #[arg(long)]
    pub verify: bool,

    /// Increase verbosity level (-v for member outcomes and debug logs, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print totals only, log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Ignore files smaller than this (e.g., 4096, 4KiB, 1MB) [default: 1024]
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Number of files hashed concurrently [default: 1]
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Content digest algorithm [default: sha1]
    #[arg(long, value_enum, value_name = "ALGO")]
    pub hash: Option<HashAlgorithm>,

    /// Let wildcards match dot-prefixed files and directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Treat hardlinks to the same file as separate files
    #[arg(long)]
    pub keep_hardlinks: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print errors as JSON objects on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Configuration file [default: platform config dir]/config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use clonedupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
