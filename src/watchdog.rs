//! # Single-shot shutdown watchdog.
//!
//! [`Watchdog`] is armed when graceful shutdown begins. If the process has
//! not exited by the time the deadline elapses, the consumer force-exits
//! after a diagnostic dump. There is no cancel operation: firing after the
//! process has exited has nothing left to act on.

use std::time::Duration;

use tokio::time;

/// Fire-once deadline for graceful shutdown.
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    deadline: Duration,
}

impl Watchdog {
    /// Creates a watchdog with the given deadline.
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Resolves once the deadline has elapsed.
    ///
    /// Arm by spawning this on a concurrent task at the moment shutdown
    /// begins; the awaiting task then dumps diagnostics and forces exit.
    pub async fn expired(self) {
        time::sleep(self.deadline).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn does_not_fire_early() {
        let dog = Watchdog::new(Duration::from_secs(180));
        let fired = tokio::spawn(dog.expired());
        // Let the task register its timer before moving the clock.
        tokio::task::yield_now().await;

        time::advance(Duration::from_secs(179)).await;
        assert!(!fired.is_finished());

        time::advance(Duration::from_secs(2)).await;
        // Let the spawned task observe the elapsed timer.
        tokio::task::yield_now().await;
        assert!(fired.is_finished());
    }
}
