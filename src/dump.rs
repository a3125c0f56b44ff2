//! # On-demand diagnostic dumps.
//!
//! [`DiagDumper`] writes a labeled snapshot of every tracked task's execution
//! state to a diagnostic sink (stderr in production). Dumps are written on
//! `SIGUSR1`, on forced exit via escalation, and on watchdog expiry.
//!
//! ## Output format
//! ```text
//! ===== PRINTING STACK ON REQUEST =====
//! task=escalation state=running for=1.2s
//! task=startup state=finished for=30.1s
//! ```
//!
//! ## Rules
//! - A failure to write is logged, never fatal, never retried.
//! - Dumping never blocks the async runtime for long: the snapshot is taken
//!   synchronously and the sink is expected to be a local stream.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::tracker::TaskTracker;

/// Writes labeled task-state snapshots to a shared sink.
///
/// Cheap to clone; clones share the sink and the tracker.
#[derive(Clone)]
pub struct DiagDumper {
    tracker: TaskTracker,
    sink: Arc<Mutex<dyn Write + Send>>,
}

impl DiagDumper {
    /// Creates a dumper over an arbitrary sink.
    pub fn new(tracker: TaskTracker, sink: impl Write + Send + 'static) -> Self {
        Self {
            tracker,
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Creates a dumper that writes to stderr.
    pub fn stderr(tracker: TaskTracker) -> Self {
        Self::new(tracker, std::io::stderr())
    }

    /// Writes a header line with `label` followed by one line per tracked
    /// task.
    ///
    /// Returns `Err` if the sink is unwritable; callers that must not fail
    /// use [`dump_or_log`](DiagDumper::dump_or_log).
    pub fn dump(&self, label: &str) -> std::io::Result<()> {
        let rows = self.tracker.snapshot();
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| std::io::Error::other("diagnostic sink poisoned"))?;

        writeln!(sink, "===== {label} =====")?;
        for (name, state, elapsed) in rows {
            writeln!(
                sink,
                "task={name} state={} for={:.1}s",
                state.as_label(),
                elapsed.as_secs_f64()
            )?;
        }
        sink.flush()
    }

    /// Like [`dump`](DiagDumper::dump), but logs the error instead of
    /// returning it.
    pub fn dump_or_log(&self, label: &str) {
        if let Err(err) = self.dump(label) {
            error!(err = %err, "failed to write diagnostic dump");
        }
    }
}
