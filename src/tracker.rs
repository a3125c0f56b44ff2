//! # Tracker of concurrently running supervisor tasks.
//!
//! Maintains authoritative state of which spawned tasks are currently
//! running, so a diagnostic dump can report them on demand.
//!
//! ## Architecture
//! ```text
//! Supervisor ──► tracker.register("watchdog") ──► TaskGuard
//!                                                    │ (dropped on task exit)
//!                                                    ▼
//!                                     HashMap<String, Entry>
//!                                        (name → {state, since})
//! ```
//!
//! ## Rules
//! - A task is `Running` from registration until its [`TaskGuard`] drops.
//! - Snapshots are taken synchronously (dump paths are sync writers), so the
//!   map sits behind a `std::sync::RwLock`, never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Execution state of one tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// The task has been spawned and has not finished.
    Running,
    /// The task finished (its guard was dropped).
    Finished,
}

impl TaskState {
    /// Short stable label for dump output.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskState::Running => "running",
            TaskState::Finished => "finished",
        }
    }
}

#[derive(Debug)]
struct Entry {
    state: TaskState,
    since: Instant,
}

/// Thread-safe registry of spawned task states.
///
/// Cheap to clone; all clones share the same map.
#[derive(Clone, Default)]
pub struct TaskTracker {
    state: Arc<RwLock<HashMap<String, Entry>>>,
}

impl TaskTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `name` as running and returns a guard that marks it finished
    /// on drop.
    ///
    /// Re-registering a name restarts its state and clock.
    pub fn register(&self, name: impl Into<String>) -> TaskGuard {
        let name = name.into();
        if let Ok(mut state) = self.state.write() {
            state.insert(
                name.clone(),
                Entry {
                    state: TaskState::Running,
                    since: Instant::now(),
                },
            );
        }
        TaskGuard {
            tracker: self.clone(),
            name,
        }
    }

    /// Returns `(name, state, time in state)` rows sorted by name.
    ///
    /// Used by [`DiagDumper`](crate::DiagDumper) to report every concurrent
    /// task's execution state.
    pub fn snapshot(&self) -> Vec<(String, TaskState, std::time::Duration)> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        let mut rows: Vec<_> = state
            .iter()
            .map(|(name, e)| (name.clone(), e.state, e.since.elapsed()))
            .collect();
        rows.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Returns `true` if `name` is currently running.
    pub fn is_running(&self, name: &str) -> bool {
        self.state
            .read()
            .map(|s| {
                s.get(name)
                    .map(|e| e.state == TaskState::Running)
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    fn finish(&self, name: &str) {
        if let Ok(mut state) = self.state.write() {
            if let Some(entry) = state.get_mut(name) {
                entry.state = TaskState::Finished;
                entry.since = Instant::now();
            }
        }
    }
}

/// Marks its task finished when dropped.
pub struct TaskGuard {
    tracker: TaskTracker,
    name: String,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tracker.finish(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_drop_marks_finished() {
        let tracker = TaskTracker::new();
        let guard = tracker.register("startup");
        assert!(tracker.is_running("startup"));

        drop(guard);
        assert!(!tracker.is_running("startup"));

        let rows = tracker.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "startup");
        assert_eq!(rows[0].1, TaskState::Finished);
    }

    #[test]
    fn snapshot_is_sorted_by_name() {
        let tracker = TaskTracker::new();
        let _w = tracker.register("watchdog");
        let _e = tracker.register("escalation");
        let _s = tracker.register("startup");

        let names: Vec<_> = tracker.snapshot().into_iter().map(|r| r.0).collect();
        assert_eq!(names, vec!["escalation", "startup", "watchdog"]);
    }

    #[test]
    fn reregister_resets_state() {
        let tracker = TaskTracker::new();
        drop(tracker.register("startup"));
        assert!(!tracker.is_running("startup"));

        let _g = tracker.register("startup");
        assert!(tracker.is_running("startup"));
    }
}
