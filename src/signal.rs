//! Ctrl+C handling.
//!
//! The first Ctrl+C raises a shared shutdown flag. Scanning, hashing and
//! cloning check it between files and wind down with whatever they have
//! finished; the run then exits with code 130. A second Ctrl+C exits
//! immediately.
//!
//! ```rust,no_run
//! use clonedupe::signal::install_handler;
//! use clonedupe::duplicates::FinderConfig;
//!
//! let handler = install_handler();
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption: 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// A handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to the scanner, finder and executor.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Lower the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// Calling this again (for instance from several tests in one process)
/// returns the already installed handler with its flag lowered. If the
/// hook cannot be installed, an unhooked handler is returned so callers
/// still get a working flag.
pub fn install_handler() -> ShutdownHandler {
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();

        let installed = ctrlc::set_handler(move || {
            if flag.swap(true, Ordering::SeqCst) {
                let _ = writeln!(std::io::stderr(), "\nInterrupted again, exiting.");
                std::process::exit(EXIT_CODE_INTERRUPTED);
            }
            let _ = writeln!(
                std::io::stderr(),
                "\nInterrupted. Finishing the current file (Ctrl+C again to abort)..."
            );
            let _ = std::io::stderr().flush();
            log::info!("Shutdown signal received");
        });

        if let Err(e) = installed {
            log::debug!("Ctrl+C handler not installed ({}), using unhooked handler", e);
        }
        handler
    });

    handler.reset();
    handler.clone()
}
