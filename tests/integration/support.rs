//! Shared fixtures for the integration tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clonedupe::actions::{CloneError, Cloner};
use clonedupe::config::Config;

/// Replaces the target with a plain copy of the source, the way a reflink
/// would, so the tests run on filesystems without block cloning.
#[derive(Debug, Default)]
pub struct CopyCloner {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl CopyCloner {
    pub fn targets(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, target)| target.clone())
            .collect()
    }
}

impl Cloner for CopyCloner {
    fn clone_file(&self, source: &Path, target: &Path, _overwrite: bool) -> Result<(), CloneError> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_path_buf(), target.to_path_buf()));
        let temp = target.with_extension("clone-tmp");
        fs::copy(source, &temp)
            .and_then(|_| fs::rename(&temp, target))
            .map_err(|e| CloneError::Io {
                path: target.to_path_buf(),
                source: e,
            })
    }
}

/// Like [`CopyCloner`] but refuses one target, as a cross-volume clone would.
#[derive(Debug)]
pub struct FailingCloner {
    pub inner: CopyCloner,
    pub fail_for: PathBuf,
}

impl FailingCloner {
    pub fn new(fail_for: impl Into<PathBuf>) -> Self {
        Self {
            inner: CopyCloner::default(),
            fail_for: fail_for.into(),
        }
    }
}

impl Cloner for FailingCloner {
    fn clone_file(&self, source: &Path, target: &Path, overwrite: bool) -> Result<(), CloneError> {
        if target == self.fail_for {
            return Err(CloneError::Reflink {
                source_path: source.to_path_buf(),
                target: target.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Unsupported, "cross-device clone"),
            });
        }
        self.inner.clone_file(source, target, overwrite)
    }
}

/// Deterministic content of `len` bytes.
pub fn content(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

/// Write `body` to `dir/name`, creating parent directories.
pub fn write(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, body).unwrap();
    path
}

/// Defaults with no minimum size.
pub fn config() -> Config {
    Config {
        min_size: 0,
        ..Config::default()
    }
}

/// `dir/**` as a pattern string.
pub fn all_under(dir: &Path) -> Vec<String> {
    vec![format!("{}/**", dir.display())]
}
