//! Layered application configuration.
//!
//! Settings are merged with `figment`, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory (`~/.config/clonedupe` on Linux,
//!    `~/Library/Application Support/com.clonedupe.clonedupe` on macOS)
//! 3. environment variables prefixed `CLONEDUPE_` (e.g. `CLONEDUPE_MIN_SIZE`)
//! 4. command-line flags
//!
//! ```toml
//! min_size = 4096
//! io_threads = 4
//! hash = "blake3"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::scanner::{HashAlgorithm, Hasher, ScanConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MIN_SIZE};

/// Prefix of environment variables read into [`Config`].
pub const ENV_PREFIX: &str = "CLONEDUPE_";

/// Errors raised while building the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Parse(String),

    /// A value parsed but is out of range.
    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The effective configuration could not be rendered.
    #[error("Cannot render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files smaller than this are ignored.
    pub min_size: u64,
    /// Files hashed concurrently.
    pub io_threads: usize,
    /// Content digest algorithm.
    pub hash: HashAlgorithm,
    /// Read size for full hashing.
    pub chunk_size: usize,
    /// Drop additional paths to an already-seen inode.
    pub skip_hardlinks: bool,
    /// Let wildcards match dot-prefixed names.
    pub include_hidden: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            io_threads: 1,
            hash: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_hardlinks: true,
            include_hidden: false,
        }
    }
}

impl Config {
    /// `config.toml` in the platform config directory, if one can be
    /// determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "clonedupe", "clonedupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load defaults, config file and `CLONEDUPE_*` environment.
    ///
    /// # Errors
    ///
    /// See [`load_from`](Self::load_from).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(explicit, ENV_PREFIX)
    }

    /// Load with a custom environment prefix.
    ///
    /// An explicit file must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] for a missing explicit file,
    /// [`ConfigError::Parse`] for malformed TOML or mistyped values,
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn load_from(explicit: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Loading config from {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        let config: Self = figment
            .merge(Env::prefixed(env_prefix))
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                key: "io_threads",
                message: "must be at least 1".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "chunk_size",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply command-line flags on top.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if a flag value is out of range.
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if let Some(hash) = cli.hash {
            self.hash = hash;
        }
        if cli.include_hidden {
            self.include_hidden = true;
        }
        if cli.keep_hardlinks {
            self.skip_hardlinks = false;
        }
        self.validate()?;
        Ok(self)
    }

    /// Scanner options derived from this configuration.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            min_size: self.min_size,
            include_hidden: self.include_hidden,
            skip_hardlinks: self.skip_hardlinks,
        }
    }

    /// Hasher derived from this configuration.
    #[must_use]
    pub fn hasher(&self) -> Hasher {
        Hasher::new()
            .with_algorithm(self.hash)
            .with_chunk_size(self.chunk_size)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Serialization failure (not expected for this type).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
