//! Lexical path normalisation.
//!
//! Patterns and matched paths are made absolute without touching the
//! filesystem: `.` components are dropped and `..` removes the preceding
//! component. Symbolic links are *not* resolved, so a path keeps the name
//! under which it was found.
//!
//! # Example
//!
//! ```
//! use clonedupe::scanner::path_utils::normalize_lexically;
//! use std::path::{Path, PathBuf};
//!
//! let p = normalize_lexically(Path::new("/data/./photos/../music/a.mp3"));
//! assert_eq!(p, PathBuf::from("/data/music/a.mp3"));
//! ```

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// `..` at the root stays at the root. Relative inputs stay relative.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Make a path absolute against `base` and normalise it lexically.
#[must_use]
pub fn absolutize_from(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Whether a file name is dot-prefixed.
#[must_use]
pub fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
