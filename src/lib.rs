//! # hubvisor
//!
//! **Hubvisor** is the startup/shutdown supervisor for a long-running hub
//! service. It creates the service instance, runs it until a termination
//! signal arrives or the instance halts on its own, then drives a graceful
//! shutdown that degrades into a forced exit when shutdown takes too long.
//!
//! ## Architecture
//! ```text
//!            ┌─────────────────────────────────────────────────────┐
//!            │  Supervisor (process lifecycle orchestrator)        │
//!            │  - creates the Instance (or runs a one-shot op)     │
//!            │  - spawns startup on a concurrent task              │
//!            │  - races: signal event  vs  instance stopped        │
//!            └───────┬───────────────┬──────────────┬──────────────┘
//!                    ▼               ▼              ▼
//!            ┌──────────────┐ ┌─────────────┐ ┌────────────────────┐
//!            │SignalListener│ │  Watchdog   │ │ EscalationCounter  │
//!            │ INT/HUP/TERM │ │ (3 min, one │ │ (5 strikes, owned  │
//!            │ QUIT + USR1  │ │  shot)      │ │  by shutdown task) │
//!            └──────┬───────┘ └──────┬──────┘ └─────────┬──────────┘
//!                   │                │                  │
//!                   │     force(1) on expiry / strike-out, after a
//!                   │     diagnostic dump of all tracked tasks
//!                   ▼                ▼                  ▼
//!            ┌─────────────────────────────────────────────────────┐
//!            │  ExitGate (atomic-once: first forced code wins)     │
//!            └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//! create() ──► CommandLine(i) ──► run one-shot op ──► exit 0 / 3
//!      │
//!      └─────► Service(i)
//!                ├─► logging start, spawn instance.start()  (fail → exit 1)
//!                ├─► wait: signal | instance.stopped()
//!                │     ├─ stopped first  ──► exit instance.exit_code()
//!                │     ├─ USR1           ──► diagnostic dump, keep waiting
//!                │     └─ termination    ──► shutdown phase
//!                └─► shutdown phase (entered exactly once):
//!                      ├─ escalation listener: 5 more strikes → dump, exit 1
//!                      ├─ watchdog: 3 minutes → dump, exit 1
//!                      └─ instance.stop() → exit instance.exit_code()
//! ```
//!
//! ## Exit codes
//! | Code | Meaning                                                        |
//! |------|----------------------------------------------------------------|
//! | 0    | one-shot operation succeeded, or instance reported 0           |
//! | 1    | start failure, forced exit (escalation/watchdog), instance's 1 |
//! | 2    | instance creation failed                                       |
//! | 3    | one-shot operation unavailable or failed                       |
//!
//! Instance-reported codes pass through verbatim.
//!
//! ## Example
//! ```no_run
//! use hubvisor::{Config, Created, Instance, InstanceError, Supervisor};
//!
//! struct Hub;
//!
//! #[async_trait::async_trait]
//! impl Instance for Hub {
//!     async fn start(&self) -> Result<(), InstanceError> { Ok(()) }
//!     async fn stop(&self) -> Result<(), InstanceError> { Ok(()) }
//!     async fn stopped(&self) { std::future::pending().await }
//!     fn exit_code(&self) -> i32 { 0 }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Supervisor::new(Config::default())
//!         .run(|| Ok(Created::Service(Hub)))
//!         .await;
//! }
//! ```

mod config;
mod dump;
mod error;
mod escalation;
mod exit;
mod instance;
mod logging;
mod signals;
mod supervisor;
mod tracker;
mod watchdog;

// ---- Public re-exports ----

pub use config::Config;
pub use dump::DiagDumper;
pub use error::{CreateError, InstanceError};
pub use escalation::EscalationCounter;
pub use exit::ExitGate;
pub use instance::{Created, Instance};
pub use logging::Logging;
pub use signals::{SignalEvent, SignalListener};
pub use supervisor::Supervisor;
pub use tracker::{TaskGuard, TaskState, TaskTracker};
pub use watchdog::Watchdog;
