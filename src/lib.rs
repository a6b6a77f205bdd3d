//! clonedupe - reclaim disk space with copy-on-write clones
//!
//! Finds byte-identical files among the paths matched by a set of glob
//! patterns and replaces every duplicate with a clone of the first copy
//! scanned. On filesystems with block cloning (APFS, Btrfs, XFS, ReFS) the
//! clones share storage, so the space taken by the duplicates is freed
//! while every path keeps its own independently writable file.
//!
//! Candidates are narrowed in three passes: by size, by a digest of the
//! first KiB, and by a digest of the whole content.
//!
//! ```no_run
//! use clonedupe::{config::Config, actions::DedupOptions, Pipeline};
//!
//! let options = DedupOptions { dry_run: true, ..Default::default() };
//! let report = Pipeline::new(Config::default(), options)
//!     .run(&["/srv/media/**".to_string()])
//!     .unwrap();
//! println!("{} bytes reclaimable", report.result.potential_savings());
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod disk;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{Cloner, DedupExecutor, DedupOptions, ReflinkCloner};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use crate::error::ExitCode;
use crate::output::{JsonReport, RunReport, TextReport};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::Scanner;
use crate::signal::ShutdownHandler;

/// A configured scan, cluster and clone run.
pub struct Pipeline {
    config: Config,
    options: DedupOptions,
    cloner: Arc<dyn Cloner>,
    shutdown: ShutdownHandler,
    progress: Option<Arc<dyn ProgressCallback>>,
    cwd: Option<PathBuf>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("shutdown", &self.shutdown)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// A pipeline cloning with [`ReflinkCloner`] and no progress display.
    #[must_use]
    pub fn new(config: Config, options: DedupOptions) -> Self {
        Self {
            config,
            options,
            cloner: Arc::new(ReflinkCloner),
            shutdown: ShutdownHandler::new(),
            progress: None,
            cwd: None,
        }
    }

    /// Use a different clone primitive.
    #[must_use]
    pub fn with_cloner(mut self, cloner: Arc<dyn Cloner>) -> Self {
        self.cloner = cloner;
        self
    }

    /// Share a shutdown flag with every stage.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownHandler) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Report progress of every stage.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolve relative patterns against `cwd` instead of the process
    /// working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Scan `patterns`, cluster the matches and clone the duplicates.
    ///
    /// # Errors
    ///
    /// Invalid or missing patterns, or [`FinderError::Interrupted`] when the
    /// shutdown flag is raised before cloning starts. Failures on single
    /// files are recorded in the report instead.
    pub fn run(&self, patterns: &[String]) -> anyhow::Result<RunReport> {
        let flag = self.shutdown.get_flag();

        let mut scanner = Scanner::new(self.config.scan_config()).with_shutdown_flag(flag.clone());
        if let Some(ref cwd) = self.cwd {
            scanner = scanner.with_cwd(cwd.clone());
        }
        if let Some(ref progress) = self.progress {
            scanner = scanner.with_progress(Arc::clone(progress));
        }

        let (candidates, scan) = scanner.scan(patterns)?;
        if scan.interrupted {
            return Err(FinderError::Interrupted.into());
        }
        let probe = candidates
            .first()
            .map(|c| c.path.clone())
            .or_else(|| self.cwd.clone())
            .or_else(|| std::env::current_dir().ok());

        let mut finder_config = FinderConfig::default()
            .with_io_threads(self.config.io_threads)
            .with_shutdown_flag(flag.clone());
        if let Some(ref progress) = self.progress {
            finder_config = finder_config.with_progress_callback(Arc::clone(progress));
        }
        let finder = DuplicateFinder::new(self.config.hasher(), finder_config);
        let (clusters, summary) = finder.find_clusters(candidates)?;

        let disk_before = probe.as_deref().and_then(disk::disk_usage);

        let mut executor = DedupExecutor::new(self.options)
            .with_cloner(Arc::clone(&self.cloner))
            .with_shutdown_flag(flag);
        if let Some(ref progress) = self.progress {
            executor = executor.with_progress_callback(Arc::clone(progress));
        }
        let result = executor.execute(&clusters);

        let disk_after = probe.as_deref().and_then(disk::disk_usage);
        let exit_code = ExitCode::from_result(&result);

        Ok(RunReport {
            scan,
            summary,
            result,
            disk_before,
            disk_after,
            algorithm: self.config.hash,
            exit_code,
        })
    }
}

/// Run the command line application.
///
/// # Errors
///
/// Configuration errors, pattern errors, interruption before cloning, and
/// failures writing the report.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_cli_overrides(&cli)?;
    log::debug!("Effective configuration: {:?}", config);

    if cli.show_config {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(config.to_toml()?.as_bytes())?;
        return Ok(ExitCode::Success);
    }

    let options = DedupOptions {
        dry_run: cli.dry_run,
        force: cli.force,
        verify: cli.verify,
    };
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));
    let report = Pipeline::new(config, options)
        .with_shutdown(signal::install_handler())
        .with_progress(progress)
        .run(&cli.patterns)?;

    let mut stdout = std::io::stdout().lock();
    match cli.output {
        OutputFormat::Text => {
            let color = !cli.no_color && std::io::stdout().is_terminal();
            TextReport::new(cli.verbose, cli.quiet, color).render(&mut stdout, &report)?;
        }
        OutputFormat::Json => JsonReport::new(&report).write_to(&mut stdout)?,
    }
    stdout.flush()?;

    Ok(report.exit_code)
}
