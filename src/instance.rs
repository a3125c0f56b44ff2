//! # The service instance seam.
//!
//! [`Instance`] is the contract between the supervisor and the long-running
//! unit it manages. The supervisor owns a single handle for the process
//! lifetime; `start` and `stop` each have exactly one call site, so the trait
//! requires no interior mutual exclusion from implementors beyond `Sync`.
//!
//! [`Created`] is the outcome of instance creation: either a normal service
//! run or a request to execute a one-shot command-line operation instead.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::InstanceError;

/// Outcome of instance creation.
///
/// The one-shot case still carries a fully built instance; only actual
/// failures are reported through [`CreateError`](crate::CreateError).
pub enum Created<I> {
    /// Run the long-lived service.
    Service(I),
    /// A one-shot command-line operation was requested; the service is never
    /// started. The operation itself is looked up via
    /// [`Instance::command_line_operation`].
    CommandLine(I),
}

/// # The long-running unit the supervisor manages.
///
/// Implementors should make [`stopped`](Instance::stopped) resolve whenever
/// the instance has halted, whether or not [`stop`](Instance::stop) was ever
/// called; the supervisor treats it as authoritative completion.
/// [`exit_code`](Instance::exit_code) is only meaningful once `stopped` has
/// resolved.
#[async_trait]
pub trait Instance: Send + Sync + 'static {
    /// Starts the service. Runs on a concurrent task; an error terminates
    /// the process with code 1.
    async fn start(&self) -> Result<(), InstanceError>;

    /// Gracefully stops the service. An error is logged but shutdown
    /// proceeds regardless.
    async fn stop(&self) -> Result<(), InstanceError>;

    /// Resolves once the instance has halted, spontaneously or after
    /// [`stop`](Instance::stop).
    async fn stopped(&self);

    /// The instance's own exit code. Valid only after
    /// [`stopped`](Instance::stopped) has resolved; passed through verbatim
    /// as the process exit code.
    fn exit_code(&self) -> i32;

    /// The one-shot command-line operation, if this invocation carries one.
    ///
    /// Returning `None` when [`Created::CommandLine`] was requested makes the
    /// process exit with code 3.
    fn command_line_operation(&self) -> Option<BoxFuture<'_, Result<(), InstanceError>>> {
        None
    }
}
