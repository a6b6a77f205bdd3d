//! Path pattern parsing.
//!
//! A [`PathPattern`] is a user-supplied path that may contain glob syntax.
//! It is made absolute and normalised up front, then split into:
//!
//! - a literal **base** directory (the leading components without any glob
//!   metacharacter), which is where enumeration starts, and
//! - a compiled matcher for the whole pattern.
//!
//! `*`, `?` and `[...]` never cross a `/`; `**` spans any number of
//! directory levels. Braces are ordinary characters, not alternation. A
//! pattern without metacharacters is literal: a file matches itself, a
//! directory matches everything below it.
//!
//! # Example
//!
//! ```
//! use clonedupe::scanner::PathPattern;
//! use std::path::Path;
//!
//! let pattern = PathPattern::parse_from("photos/**/*.jpg", Path::new("/home/user")).unwrap();
//! assert_eq!(pattern.base(), Path::new("/home/user/photos"));
//! assert!(pattern.is_match(Path::new("/home/user/photos/2023/a.jpg")));
//! assert!(!pattern.is_match(Path::new("/home/user/photos/2023/a.png")));
//! ```

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use super::path_utils::{absolutize_from, is_hidden_name};
use super::ScanError;

/// A parsed, absolute path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    absolute: PathBuf,
    base: PathBuf,
    matcher: Option<GlobMatcher>,
    max_depth: Option<usize>,
    names_hidden: bool,
}

impl PathPattern {
    /// Parse a pattern relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidPattern`] if the pattern is empty, has
    /// invalid glob syntax, or the current directory cannot be determined.
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let cwd = std::env::current_dir().map_err(|e| ScanError::InvalidPattern {
            pattern: raw.to_string(),
            message: format!("cannot resolve current directory: {e}"),
        })?;
        Self::parse_from(raw, &cwd)
    }

    /// Parse a pattern, resolving relative patterns against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidPattern`] if the pattern is empty or has
    /// invalid glob syntax.
    pub fn parse_from(raw: &str, cwd: &Path) -> Result<Self, ScanError> {
        if raw.is_empty() {
            return Err(ScanError::InvalidPattern {
                pattern: raw.to_string(),
                message: "empty pattern".to_string(),
            });
        }

        let absolute = absolutize_from(Path::new(raw), cwd);

        let mut base = PathBuf::new();
        let mut glob_parts: Vec<String> = Vec::new();
        for component in absolute.components() {
            let text = component.as_os_str().to_string_lossy();
            if glob_parts.is_empty()
                && (!has_glob_meta(&text) || !matches!(component, Component::Normal(_)))
            {
                base.push(component.as_os_str());
            } else {
                glob_parts.push(text.into_owned());
            }
        }

        if glob_parts.is_empty() {
            log::trace!("Literal pattern: {}", absolute.display());
            return Ok(Self {
                raw: raw.to_string(),
                base: absolute.clone(),
                absolute,
                matcher: None,
                max_depth: None,
                names_hidden: false,
            });
        }

        let recursive = glob_parts.iter().any(|part| part.contains("**"));
        let names_hidden = glob_parts.iter().any(|part| part.starts_with('.'));

        let glob = GlobBuilder::new(&escape_braces(&absolute.to_string_lossy()))
            .literal_separator(true)
            .build()
            .map_err(|e| ScanError::InvalidPattern {
                pattern: raw.to_string(),
                message: e.kind().to_string(),
            })?;

        log::trace!(
            "Glob pattern: base={} remainder={}",
            base.display(),
            glob_parts.join("/")
        );

        Ok(Self {
            raw: raw.to_string(),
            absolute,
            base,
            matcher: Some(glob.compile_matcher()),
            max_depth: if recursive {
                None
            } else {
                Some(glob_parts.len())
            },
            names_hidden,
        })
    }

    /// The pattern as the user wrote it.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The absolute, normalised pattern.
    #[must_use]
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Directory where enumeration starts.
    ///
    /// For a literal pattern this is the path itself.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether the pattern contains no glob metacharacters.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.matcher.is_none()
    }

    /// Deepest level below [`base`](Self::base) a match can live at.
    ///
    /// `None` means unbounded (the pattern contains `**`, or it is a literal
    /// directory).
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Whether the wildcard part explicitly names a dot-prefixed component.
    #[must_use]
    pub fn names_hidden(&self) -> bool {
        self.names_hidden
    }

    /// Whether an absolute path matches this pattern.
    ///
    /// Literal patterns match the path itself and anything below it.
    #[must_use]
    pub fn is_match(&self, path: &Path) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.is_match(path),
            None => path.starts_with(&self.base),
        }
    }

    /// Whether a path below the base may be visited given dot-name rules.
    ///
    /// `path` is checked component by component relative to the base.
    #[must_use]
    pub fn allows_hidden_in(&self, path: &Path, include_hidden: bool) -> bool {
        if include_hidden || self.names_hidden {
            return true;
        }
        let relative = path.strip_prefix(&self.base).unwrap_or(path);
        !relative
            .components()
            .any(|c| matches!(c, Component::Normal(name) if is_hidden_name(name)))
    }
}

/// Whether a path component contains glob metacharacters.
fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Turn `{` and `}` outside `[...]` into single-character classes so
/// globset reads them literally.
fn escape_braces(glob: &str) -> String {
    let mut escaped = String::with_capacity(glob.len());
    let mut in_class = false;
    for c in glob.chars() {
        match c {
            '[' if !in_class => {
                in_class = true;
                escaped.push(c);
            }
            ']' if in_class => {
                in_class = false;
                escaped.push(c);
            }
            '{' if !in_class => escaped.push_str("[{]"),
            '}' if !in_class => escaped.push_str("[}]"),
            _ => escaped.push(c),
        }
    }
    escaped
}
