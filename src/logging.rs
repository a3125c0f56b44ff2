//! # Process-wide log lifecycle.
//!
//! Thin wrapper over `tracing-subscriber` with the explicit start/shutdown
//! shape the supervisor expects: [`Logging::start`] is called once before the
//! service starts, [`Logging::shutdown`] on each orderly exit path. Forced
//! exits (escalation, watchdog) terminate immediately without a flush.

use std::io::Write;

use tracing_subscriber::EnvFilter;

/// Start/shutdown handle for the process-wide logger.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logging;

impl Logging {
    /// Installs the global subscriber: stderr output, `RUST_LOG` filter,
    /// defaulting to `warn`.
    ///
    /// Idempotent; only the first caller installs.
    pub fn start(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Flushes buffered log output before the process exits.
    pub fn shutdown(&self) {
        let _ = std::io::stderr().flush();
    }
}
