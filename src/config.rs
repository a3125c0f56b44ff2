//! # Global supervisor configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor lifecycle.
//!
//! ## Sentinel values
//! - `signal_capacity` is clamped to a minimum of 1 by the listener; a signal
//!   arriving between registration and the first wait must never be dropped.

use std::time::Duration;

/// Configuration for the supervisor lifecycle.
///
/// ## Field semantics
/// - `escalation_budget`: termination signals tolerated during shutdown before
///   the process is force-terminated
/// - `watchdog`: maximum wall-clock time graceful shutdown may take
/// - `signal_capacity`: depth of the buffered signal channel (min 1)
/// - `service_name`: short name used in operator-facing notices
///
/// All fields are public; prefer the helper accessors over repeating clamp
/// logic at call sites.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of termination signals tolerated during shutdown.
    ///
    /// Each termination-kind signal received after shutdown has begun
    /// decrements the budget; at zero the process force-exits with code 1.
    pub escalation_budget: u32,

    /// Deadline for graceful shutdown.
    ///
    /// Armed when shutdown begins. If `stop()` has not returned by then, the
    /// process force-exits with code 1 after a diagnostic dump.
    pub watchdog: Duration,

    /// Capacity of the buffered signal channel.
    ///
    /// Back-to-back signals during the escalation window queue here; the
    /// forwarding task blocks rather than drop when the buffer is full.
    pub signal_capacity: usize,

    /// Short service name for operator-facing log lines.
    pub service_name: &'static str,
}

impl Config {
    /// Returns the signal channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn signal_capacity_clamped(&self) -> usize {
        self.signal_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `escalation_budget = 5`
    /// - `watchdog = 3 minutes`
    /// - `signal_capacity = 8`
    /// - `service_name = "hub"`
    fn default() -> Self {
        Self {
            escalation_budget: 5,
            watchdog: Duration::from_secs(3 * 60),
            signal_capacity: 8,
            service_name: "hub",
        }
    }
}
