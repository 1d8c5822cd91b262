//! # Scheduler: the public handle.
//!
//! A [`Scheduler`] is an explicit handle over one runtime instance (engine, registry,
//! admission limiter, event bus). Any number of schedulers can coexist in a process.
//!
//! ## Operations
//! | Method | Policy | Job kind |
//! |---|---|---|
//! | [`schedule`](Scheduler::schedule) | [`CronSchedule`] | recurring |
//! | [`every`](Scheduler::every) | [`Every`] | recurring |
//! | [`once_now`](Scheduler::once_now) | [`OnceNow`] | once |
//! | [`at`](Scheduler::at) | [`AbsoluteOnce`] | once |
//! | [`n_times_every`](Scheduler::n_times_every) | [`NTimesEvery`] | recurring, finished after `n` runs |
//! | [`debounced`](Scheduler::debounced) | [`AbsoluteOnce`] replacing same-name entries | once |
//!
//! ## Shutdown
//! ```text
//! stop()           ── cancel runtime token ──► engine loop, maintenance loop, listeners exit
//! shutdown().await ── stop() ──► wait in-flight executions up to cfg.grace
//!                                   ├─ Ok        → AllStoppedWithin
//!                                   └─ timeout   → GraceExceeded + RuntimeError::GraceExceeded
//! run_until_signal().await ── wait SIGINT/SIGTERM/SIGQUIT ──► shutdown()
//! ```
//! Runners receive a child of the runtime token as their `ctx`; it is cancelled by `stop()`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use jobvisor::{Config, Job, JobError, Scheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.pool_size = 4;
//!     cfg.grace = Duration::from_secs(5);
//!
//!     let sched = Scheduler::builder(cfg).build();
//!     let _changes = sched.on_job_changed(|job| {
//!         println!("{} is {}", job.name, job.state);
//!     });
//!
//!     let job = Job::from_fn("report", |_ctx: CancellationToken| async {
//!         Ok::<_, JobError>(())
//!     });
//!     sched.n_times_every(3, Duration::from_secs(1), job.into_ref()).await?;
//!
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!     sched.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::builder::SchedulerBuilder;
use super::config::Config;
use super::runtime::Runtime;
use super::shutdown;
use crate::engine::EntryId;
use crate::error::{RuntimeError, ScheduleError};
use crate::events::{Event, EventKind};
use crate::jobs::{JobKind, JobRef, JobSnapshot};
use crate::schedules::{AbsoluteOnce, CronSchedule, Every, NTimesEvery, OnceNow};
use crate::subscribers::Subscription;

/// Read-only view of one live engine entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub id: EntryId,
    pub job: JobSnapshot,
    /// Next fire time (`None` if exhausted and awaiting the sweep).
    pub next: Option<DateTime<Utc>>,
    /// Last fire time.
    pub prev: Option<DateTime<Utc>>,
}

/// Handle to a running scheduler. Dropping it stops the scheduler (see [`Scheduler::stop`]).
pub struct Scheduler {
    rt: Arc<Runtime>,
}

impl Scheduler {
    /// Starts building a scheduler.
    pub fn builder(cfg: Config) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub(crate) fn from_runtime(rt: Arc<Runtime>) -> Self {
        Self { rt }
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &Config {
        &self.rt.cfg
    }

    /// Current scheduler time.
    pub fn now(&self) -> DateTime<Utc> {
        self.rt.now()
    }

    /// Runs `job` on a calendar expression.
    ///
    /// Accepts 5-field standard expressions, 6/7-field expressions with seconds, and
    /// `@hourly`-style descriptors.
    pub async fn schedule(&self, spec: &str, job: JobRef) -> Result<EntryId, ScheduleError> {
        let cron = CronSchedule::parse(spec)?;
        Ok(self
            .rt
            .register(Arc::new(cron), JobKind::Recurring, job)
            .await)
    }

    /// Runs `job` every `interval` (rounded down to whole seconds, at least one second).
    pub async fn every(&self, interval: Duration, job: JobRef) -> EntryId {
        self.rt
            .register(Arc::new(Every::new(interval)), JobKind::Recurring, job)
            .await
    }

    /// Runs `job` once, immediately.
    pub async fn once_now(&self, job: JobRef) -> EntryId {
        self.rt
            .register(Arc::new(OnceNow::new()), JobKind::Once, job)
            .await
    }

    /// Runs `job` once at `instant`.
    ///
    /// # Errors
    /// [`ScheduleError::InPast`] if `instant` is not after [`now`](Self::now); nothing is
    /// registered in that case.
    pub async fn at(&self, instant: DateTime<Utc>, job: JobRef) -> Result<EntryId, ScheduleError> {
        if instant <= self.now() {
            return Err(ScheduleError::InPast { at: instant });
        }
        Ok(self
            .rt
            .register(Arc::new(AbsoluteOnce::new(instant)), JobKind::Once, job)
            .await)
    }

    /// Runs `job` exactly `n` times, `interval` apart; the entry is then removed and the
    /// job marked finished.
    ///
    /// # Errors
    /// [`ScheduleError::ZeroRepetitions`] if `n == 0`.
    pub async fn n_times_every(
        &self,
        n: u32,
        interval: Duration,
        job: JobRef,
    ) -> Result<EntryId, ScheduleError> {
        if n == 0 {
            return Err(ScheduleError::ZeroRepetitions);
        }
        Ok(self
            .rt
            .register(
                Arc::new(NTimesEvery::new(n, interval)),
                JobKind::Recurring,
                job,
            )
            .await)
    }

    /// Runs `job` once, `delay` from now, replacing every pending entry whose job has the
    /// same name.
    pub async fn debounced(&self, delay: Duration, job: JobRef) -> EntryId {
        self.rt.debounce(delay, job).await
    }

    /// Removes an entry. Returns `false` if it does not exist (anymore).
    pub async fn remove(&self, id: EntryId) -> bool {
        self.rt.remove(id).await
    }

    /// Snapshot of every live entry, ordered by id.
    pub async fn status(&self) -> Vec<EntryStatus> {
        let table = self.rt.registry.read().await;
        let mut out: Vec<EntryStatus> = self
            .rt
            .engine
            .entries()
            .into_iter()
            .filter_map(|entry| {
                let job = table.get(entry.id)?;
                Some(EntryStatus {
                    id: entry.id,
                    job: job.snapshot(),
                    next: entry.next,
                    prev: entry.prev,
                })
            })
            .collect();
        out.sort_unstable_by_key(|s| s.id);
        out
    }

    /// Names of jobs with at least one live entry, sorted.
    pub async fn job_names(&self) -> Vec<String> {
        self.rt.registry.names().await
    }

    /// Raw event stream. Only events published after this call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.rt.bus.subscribe()
    }

    /// Calls `callback` with a snapshot every time a job's observable state changes.
    ///
    /// The callback runs on a dedicated task; panics are contained and reported as
    /// `SubscriberPanicked`. Cancel or drop the returned [`Subscription`] to unsubscribe.
    pub fn on_job_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&JobSnapshot) + Send + Sync + 'static,
    {
        Subscription::spawn(&self.rt.bus, self.rt.token.clone(), callback)
    }

    /// Free admission permits (`None` when unbounded).
    pub fn available_permits(&self) -> Option<usize> {
        self.rt.limiter.available()
    }

    /// True while the engine timer loop runs and [`stop`](Self::stop) has not been called.
    pub fn is_running(&self) -> bool {
        !self.rt.token.is_cancelled() && self.rt.engine.is_running()
    }

    /// Stops scheduling: no new triggers fire, background loops exit. Executions already
    /// running complete on their own.
    pub fn stop(&self) {
        if !self.rt.token.is_cancelled() {
            tracing::info!("scheduler stopping");
        }
        self.rt.stop();
    }

    /// Stops and waits up to [`Config::grace`] for in-flight executions.
    ///
    /// # Errors
    /// [`RuntimeError::GraceExceeded`] with the names of jobs still running.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.rt
            .bus
            .publish(Event::new(EventKind::ShutdownRequested));
        self.stop();

        let grace = self.rt.cfg.grace;
        match tokio::time::timeout(grace, self.rt.engine.drain()).await {
            Ok(()) => {
                self.rt.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                self.rt.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.stuck().await;
                tracing::warn!(?grace, ?stuck, "shutdown grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Waits for a termination signal, then [`shutdown`](Self::shutdown)s.
    ///
    /// If signal handlers cannot be installed, shuts down immediately.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        if let Err(err) = shutdown::wait_for_shutdown_signal().await {
            tracing::warn!(error = %err, "cannot listen for shutdown signals");
        }
        self.shutdown().await
    }

    /// Jobs still running; the alive tracker is eventually consistent, so live registry
    /// jobs in `Running` state are merged in.
    async fn stuck(&self) -> Vec<String> {
        let mut stuck = self.rt.alive.snapshot().await;
        let table = self.rt.registry.read().await;
        for (_, job) in table.list() {
            if job.state() == crate::jobs::JobState::Running {
                stuck.push(job.name().to_string());
            }
        }
        stuck.sort_unstable();
        stuck.dedup();
        stuck
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.rt.stop();
    }
}
