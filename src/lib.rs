//! # jobvisor
//!
//! **Jobvisor** coordinates the execution of recurring and one-shot jobs on top of a
//! time-based scheduling engine.
//!
//! The engine decides *when* an entry fires. Jobvisor decides what happens next:
//! - the same job never overlaps with itself (per-job execution guard),
//! - total concurrent executions are bounded (admission limiter),
//! - repeated requests for one job name collapse into a single delayed run (debounce),
//! - subscribers hear about a job only when something observable changed (fingerprints),
//! - exhausted entries are cleaned up (sweep).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   every / at / once_now / n_times_every / schedule / debounced
//!                              │
//!                              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler (explicit handle, one per runtime instance)            │
//! │  - Engine (entries: id, policy, next, prev, trigger)              │
//! │  - Registry (entry id → Job)                                      │
//! │  - Limiter (process-wide semaphore, pool_size permits)            │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        │ timer loop fires entry       │ maintenance loop
//!        ▼                              ▼ (every state_update_interval)
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │ run_guarded(job)         │   │ refresh next/prev        │
//! │  guard → limiter → run   │   │ sweep exhausted entries  │
//! │  (catch_unwind)          │   └────────────┬─────────────┘
//! └────────────┬─────────────┘                │
//!              │ every transition             │
//!              ▼                              ▼
//!        notify(job): fingerprint changed? ──► Bus ──► JobChanged
//!                                               ├──► on_job_changed callbacks
//!                                               ├──► SubscriberSet workers
//!                                               └──► subscribe() receivers
//! ```
//!
//! ### Job lifecycle
//! ```text
//! New ──schedule──► Initializing ──trigger──► Running ──► Idle      (recurring)
//!                                    │                └─► Finished  (once / exhausted)
//!                                    └─► ExecutionDeferred ── Queue ──► Running
//!                                                          └─ Skip ───► resting state
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Scheduling**    | Cron, interval, now, at, N times, debounced              | [`Scheduler`], [`EntryId`]                  |
//! | **Jobs**          | Named async runners with observable state                | [`Job`], [`JobRef`], [`Runner`], [`RunnerFn`] |
//! | **Policies**      | Time policies and deferred-trigger handling              | [`schedules`], [`DeferredPolicy`]           |
//! | **Observability** | Change stream, callbacks, custom subscribers             | [`Event`], [`Subscribe`], [`Subscription`]  |
//! | **Errors**        | Typed errors for requests, executions and shutdown       | [`ScheduleError`], [`JobError`], [`RuntimeError`] |
//! | **Configuration** | Centralized runtime settings                             | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber that renders events through
//!   `tracing` _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use jobvisor::{Config, Job, JobError, Scheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sched = Scheduler::builder(Config::default()).build();
//!
//!     let hello = Job::from_fn("hello", |_ctx: CancellationToken| async {
//!         println!("Hello from job!");
//!         Ok::<_, JobError>(())
//!     });
//!     sched.once_now(hello.into_ref()).await;
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     sched.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod engine;
mod error;
mod events;
mod jobs;
mod policies;
pub mod schedules;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    Config, DEFAULT_POOL_SIZE, DEFAULT_STATE_UPDATE_INTERVAL, EntryStatus, Scheduler,
    SchedulerBuilder,
};
pub use engine::EntryId;
pub use error::{JobError, RuntimeError, ScheduleError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{
    Job, JobId, JobKind, JobRef, JobSnapshot, JobState, Runner, RunnerFn, RunnerRef,
};
pub use policies::DeferredPolicy;
pub use subscribers::{Subscribe, SubscriberSet, Subscription};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
