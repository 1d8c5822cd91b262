//! # Function-backed runner (`RunnerFn`)
//!
//! [`RunnerFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per trigger. Nothing is shared between triggers unless the closure captures it
//! explicitly (e.g. an `Arc<AtomicUsize>` counter).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use jobvisor::{JobError, RunnerFn, RunnerRef};
//!
//! let r: RunnerRef = RunnerFn::arc(|_ctx: CancellationToken| async move {
//!     Ok::<_, JobError>(())
//! });
//! # let _ = r;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::jobs::runner::Runner;

/// Function-backed runner implementation.
#[derive(Debug)]
pub struct RunnerFn<F> {
    f: F,
}

impl<F> RunnerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the runner and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), JobError> {
        (self.f)(ctx).await
    }
}
