//! File actions module.
//!
//! This module provides functionality for:
//! - Replacing duplicates with copy-on-write clones
//! - Byte-for-byte verification before cloning
//!
//! # Cloning
//!
//! ```no_run
//! use clonedupe::actions::{Cloner, ReflinkCloner};
//! use std::path::Path;
//!
//! ReflinkCloner
//!     .clone_file(Path::new("/data/a.iso"), Path::new("/data/copy-of-a.iso"), false)
//!     .unwrap();
//! ```
//!
//! # Verification
//!
//! ```no_run
//! use clonedupe::actions::files_identical;
//! use std::path::Path;
//!
//! let same = files_identical(Path::new("/data/a.iso"), Path::new("/data/b.iso")).unwrap();
//! ```

pub mod clone;
pub mod verify;

pub use clone::{
    CloneError, Cloner, ClusterReport, DedupExecutor, DedupOptions, DedupResult, MemberOutcome,
    MemberReport, ReflinkCloner,
};
pub use verify::files_identical;
