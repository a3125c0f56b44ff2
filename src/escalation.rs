//! # Escalation counter for repeated termination requests.
//!
//! Once shutdown has begun, every further termination-kind signal decrements
//! a fixed budget; at zero the caller force-exits the process. Diagnostic
//! dump requests never touch the budget.
//!
//! The counter is deliberately not thread-safe: it is owned and mutated by
//! the single shutdown-phase listening task only.

/// Counts down repeated termination requests during shutdown.
///
/// ### Rules
/// - Starts at the configured budget (default 5).
/// - [`on_termination`](EscalationCounter::on_termination) decrements once
///   per termination-kind signal and returns the remaining budget.
/// - The caller forces exit when the returned value reaches 0.
#[derive(Debug)]
pub struct EscalationCounter {
    remaining: u32,
}

impl EscalationCounter {
    /// Creates a counter with the given budget.
    pub fn new(budget: u32) -> Self {
        Self { remaining: budget }
    }

    /// Records one termination-kind signal and returns the remaining budget.
    ///
    /// Saturates at 0; callers treat 0 as "force exit now".
    pub fn on_termination(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    /// Remaining budget without recording a signal.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}
