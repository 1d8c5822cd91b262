//! # The unit of work behind a job.
//!
//! [`Runner`] is what the user implements: one async `run` per trigger. It receives the
//! scheduler's [`CancellationToken`], which is cancelled on [`Scheduler::stop`](crate::Scheduler::stop);
//! in-flight executions are never aborted, so long runners should check it and return early.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;

/// # Asynchronous unit of work executed on every trigger.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use jobvisor::{JobError, Runner};
///
/// struct Rotate;
///
/// #[async_trait]
/// impl Runner for Rotate {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), JobError> {
///         if ctx.is_cancelled() {
///             return Ok(());
///         }
///         // rotate logs...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    /// Executes one trigger.
    ///
    /// Errors are recorded as the job result; panics are caught and recorded as
    /// [`JobError::Panicked`]. Neither propagates past the scheduler.
    async fn run(&self, ctx: CancellationToken) -> Result<(), JobError>;
}

/// Shared handle to a runner.
pub type RunnerRef = Arc<dyn Runner>;
