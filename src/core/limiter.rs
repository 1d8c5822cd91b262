//! # Admission limiter: process-wide bound on concurrent executions.
//!
//! One semaphore shared by every job of a scheduler. Permits are owned RAII guards, so
//! every exit path of a guarded run (success, failure, contained panic, skip) releases
//! the permit it took.
//!
//! ```text
//! try_acquire() ── permit free ──► Ok(Some(permit))
//!               ── saturated   ──► Err(Saturated) ── Queue ──► acquire().await
//!               ── unbounded   ──► Ok(None)        └─ Skip ──► drop trigger
//! ```

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The limiter had no free permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Saturated;

pub(crate) struct Limiter {
    sem: Option<Arc<Semaphore>>,
    capacity: Option<usize>,
}

impl Limiter {
    /// `None` disables the limiter.
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            sem: limit.map(|n| Arc::new(Semaphore::new(n))),
            capacity: limit,
        }
    }

    /// Takes a permit without waiting. `Ok(None)` when unbounded.
    pub(crate) fn try_acquire(&self) -> Result<Option<OwnedSemaphorePermit>, Saturated> {
        match &self.sem {
            None => Ok(None),
            Some(sem) => Arc::clone(sem)
                .try_acquire_owned()
                .map(Some)
                .map_err(|_| Saturated),
        }
    }

    /// Waits for a permit. `None` when unbounded.
    pub(crate) async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.sem {
            None => None,
            Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
        }
    }

    /// Free permits (`None` when unbounded).
    pub(crate) fn available(&self) -> Option<usize> {
        self.sem.as_ref().map(|s| s.available_permits())
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
