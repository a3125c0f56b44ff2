//! # Single guarded exit path.
//!
//! Several fire-and-forget tasks (failed startup, escalation listener,
//! watchdog) race the main shutdown sequence to terminate the process.
//! [`ExitGate`] funnels them through one atomic-once guard so only the first
//! caller's exit code is ever observed.
//!
//! ## Rules
//! - [`force`](ExitGate::force) records the first code and trips the gate;
//!   later calls are no-ops.
//! - [`forced`](ExitGate::forced) resolves with that first code. The
//!   supervisor races it against its own shutdown sequence, so a forced exit
//!   never waits for an in-flight graceful stop.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Atomic-once exit code gate shared by all lifecycle tasks.
#[derive(Clone, Default)]
pub struct ExitGate {
    code: Arc<OnceLock<i32>>,
    token: CancellationToken,
}

impl ExitGate {
    /// Creates an untripped gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests immediate process termination with `code`.
    ///
    /// Only the first call wins; subsequent codes are discarded.
    pub fn force(&self, code: i32) {
        if self.code.set(code).is_ok() {
            self.token.cancel();
        }
    }

    /// Resolves with the forced exit code once the gate is tripped.
    pub async fn forced(&self) -> i32 {
        self.token.cancelled().await;
        // set() always precedes cancel().
        self.code.get().copied().unwrap_or(1)
    }

    /// Returns the forced code if the gate has tripped.
    pub fn code(&self) -> Option<i32> {
        self.code.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_force_wins() {
        let gate = ExitGate::new();
        gate.force(1);
        gate.force(7);
        assert_eq!(gate.forced().await, 1);
        assert_eq!(gate.code(), Some(1));
    }

    #[tokio::test]
    async fn forced_resolves_across_tasks() {
        let gate = ExitGate::new();
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.forced().await })
        };
        gate.force(3);
        assert_eq!(waiter.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn untripped_gate_reports_no_code() {
        let gate = ExitGate::new();
        assert_eq!(gate.code(), None);
    }
}
