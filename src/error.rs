//! Error types used at the supervisor/instance seam.
//!
//! Two enums cover the taxonomy:
//!
//! - [`CreateError`] — instance creation failed; always fatal (exit code 2).
//! - [`InstanceError`] — failures raised by the instance itself; fatal for
//!   `start`, logged-and-ignored for `stop`, exit-code-3 for a one-shot
//!   command-line operation.
//!
//! Both provide `as_label()` for stable snake_case labels in logs.

use thiserror::Error;

/// # Instance creation failure.
///
/// Raised by the caller-supplied factory when the instance could not be
/// built for a reason other than a command-line-operation request (that case
/// is not an error; see [`Created`](crate::Created)).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CreateError {
    /// Creation failed; the process exits with code 2 without starting
    /// or stopping anything.
    #[error("error creating an instance: {reason}")]
    Failed {
        /// The underlying error message.
        reason: String,
    },
}

impl CreateError {
    /// Builds a creation failure from any displayable cause.
    pub fn new(reason: impl ToString) -> Self {
        CreateError::Failed {
            reason: reason.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CreateError::Failed { .. } => "instance_create_failed",
        }
    }
}

/// # Errors raised by the service instance.
///
/// These surface through the [`Instance`](crate::Instance) trait. How they are
/// handled depends on the operation: a start failure terminates the process,
/// a stop failure is logged and shutdown proceeds, a command-line-operation
/// failure maps to exit code 3.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum InstanceError {
    /// Instance startup failed (fatal, exit code 1).
    #[error("instance start failed: {reason}")]
    Start {
        /// The underlying error message.
        reason: String,
    },

    /// Graceful stop failed (non-fatal; shutdown proceeds regardless).
    #[error("failed to stop: {reason}")]
    Stop {
        /// The underlying error message.
        reason: String,
    },

    /// One-shot command-line operation failed (exit code 3).
    #[error("command line operation failed: {reason}")]
    CmdLine {
        /// The underlying error message.
        reason: String,
    },
}

impl InstanceError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use hubvisor::InstanceError;
    ///
    /// let err = InstanceError::Stop { reason: "busy".into() };
    /// assert_eq!(err.as_label(), "instance_stop_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            InstanceError::Start { .. } => "instance_start_failed",
            InstanceError::Stop { .. } => "instance_stop_failed",
            InstanceError::CmdLine { .. } => "cmdline_op_failed",
        }
    }
}
