//! # What to do with a trigger that cannot run right away.
//!
//! A trigger is *deferred* when either:
//! - the job's execution guard is held by a previous, still running invocation, or
//! - the admission limiter has no free permit.
//!
//! In both cases the job transitions to [`JobState::ExecutionDeferred`](crate::JobState)
//! and subscribers are notified. [`DeferredPolicy`] then decides the fate of the trigger.
//!
//! ## Variants
//! - `Skip`: drop this trigger; the next engine tick gets a fresh chance.
//! - `Queue`: wait (asynchronously) until the guard or permit becomes available, then run.
//!
//! ## Invariants
//! - Neither variant ever lets two invocations of the same job overlap
//!   (unless self-concurrency is enabled in [`Config`](crate::Config)).
//! - Queued triggers hold no permit while they wait.

/// Policy controlling deferred triggers.
///
/// Set globally with [`Config::deferred`](crate::Config) and overridden per job with
/// [`Job::with_deferred`](crate::Job::with_deferred).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeferredPolicy {
    /// Drop the trigger.
    ///
    /// Use when:
    /// - Only the latest state matters
    /// - Catching up on missed ticks is pointless
    /// - Example: periodic health checks
    Skip,

    /// Wait for the guard/permit and run late (default).
    ///
    /// Use when:
    /// - Every trigger must execute
    /// - Example: draining a work queue on every tick
    #[default]
    Queue,
}

impl DeferredPolicy {
    /// True for [`DeferredPolicy::Skip`].
    #[inline]
    pub fn drops(&self) -> bool {
        matches!(self, DeferredPolicy::Skip)
    }
}
