//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Phase 1)
//! - Prefix hash comparison (Phase 2)
//! - Full hash comparison (Phase 3)
//! - Cluster management

pub mod finder;
pub mod groups;

pub use finder::{
    format_size, phase2_prefix, phase3_full, ClusterSummary, DuplicateFinder, FinderConfig,
    FinderError, PhaseStats,
};
pub use groups::{group_by_size, Cluster, GroupingStats, PrefixBucket, SizeBucket};
