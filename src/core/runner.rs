//! # Guarded execution of a single trigger.
//!
//! Runs one trigger of a [`Job`](crate::Job) through the execution guard and the admission
//! limiter, drives the job state machine, and contains panics.
//!
//! ## Flow
//! ```text
//! guard.try_acquire ── busy ──► ExecutionDeferred ── Skip ──► return (holder finishes)
//!        │                                        └─ Queue ─► guard.acquire().await
//!        ▼
//! limiter.try_acquire ── saturated ──► ExecutionDeferred ── Skip ──► resting state,
//!        │                                               │           release guard, return
//!        │                                               └─ Queue ─► limiter.acquire().await
//!        ▼
//! Running (run_start) ──► runner.run(ctx) under catch_unwind ──► release permit
//!        ──► run_end, result ──► Idle | Finished (no entry left) ──► release guard
//! ```
//!
//! ## Rules
//! - Every transition is followed by `Runtime::notify`, which publishes only real changes.
//! - Panics never escape; they become [`JobError::Panicked`] plus a `JobPanicked` event.
//! - Permit and guard are RAII values: no exit path leaks either.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::runtime::Runtime;
use crate::error::JobError;
use crate::events::{Event, EventKind};
use crate::jobs::{JobRef, JobState};

/// Executes one trigger of `job`.
pub(crate) async fn run_guarded(rt: &Runtime, job: &JobRef) {
    let policy = job.deferred().unwrap_or(rt.cfg.deferred);

    let guard = if rt.cfg.self_concurrent {
        None
    } else {
        match job.try_guard() {
            Ok(permit) => Some(permit),
            Err(_) => {
                job.set_state(JobState::ExecutionDeferred);
                rt.notify(job);
                if policy.drops() {
                    tracing::debug!(job = job.name(), "trigger skipped: previous execution still running");
                    return;
                }
                match job.guard().await {
                    Some(permit) => Some(permit),
                    None => return,
                }
            }
        }
    };

    let permit = match rt.limiter.try_acquire() {
        Ok(permit) => permit,
        Err(_) => {
            job.set_state(JobState::ExecutionDeferred);
            rt.notify(job);
            if policy.drops() {
                tracing::debug!(job = job.name(), "trigger skipped: admission limiter saturated");
                job.rest();
                rt.notify(job);
                drop(guard);
                return;
            }
            rt.limiter.acquire().await
        }
    };

    job.begin_run(rt.now());
    rt.notify(job);

    let ctx = rt.token.child_token();
    let result = match AssertUnwindSafe(job.runner().run(ctx)).catch_unwind().await {
        Ok(res) => res,
        Err(panic_err) => {
            let info = panic_message(&*panic_err);
            tracing::error!(job = job.name(), %info, "job runner panicked");
            rt.bus.publish(
                Event::for_job(EventKind::JobPanicked, job.snapshot()).with_reason(info.as_str()),
            );
            Err(JobError::Panicked { info })
        }
    };
    if let Err(err) = &result {
        tracing::debug!(job = job.name(), error = %err, "job execution failed");
    }

    drop(permit);
    // settle the state before a queued trigger can take the guard and begin its run
    job.end_run(rt.now(), result);
    rt.notify(job);
    drop(guard);
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
