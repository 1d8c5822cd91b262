//! # Job: identity, lifecycle state and the execution guard.
//!
//! A [`Job`] pairs a name with a [`Runner`] and carries everything observable about its
//! executions. Jobs are shared as [`JobRef`] (`Arc<Job>`) between the caller, the engine
//! entry and the registry.
//!
//! ## Locking
//! - Mutable fields live behind one per-job `std::sync::Mutex`, never held across `.await`.
//! - The execution guard is a separate one-permit semaphore, held for the whole execution.
//! - `in_flight` counts dispatched executions that have not completed yet; `pending` counts
//!   engine entries that can still fire for this job. A job rests in `Finished` only when
//!   both are exhausted, decided under the job mutex, so it is reached exactly once and
//!   never while another entry is still waiting.
//! - Registering a job that is executing leaves its state alone; the execution settles it.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

use crate::engine::EntryId;
use crate::error::JobError;
use crate::jobs::fingerprint::{Fingerprint, Observed};
use crate::jobs::runner::RunnerRef;
use crate::jobs::runner_fn::RunnerFn;
use crate::jobs::state::{JobKind, JobState};
use crate::policies::DeferredPolicy;

/// Shared handle to a job.
pub type JobRef = Arc<Job>;

/// Process-unique identity of a [`Job`] value; distinct jobs may share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        JobId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Mutable, lock-protected part of a job.
#[derive(Default)]
struct Inner {
    state: JobState,
    last_state: JobState,
    kind: JobKind,
    run_start: Option<DateTime<Utc>>,
    run_end: Option<DateTime<Utc>>,
    next: Option<DateTime<Utc>>,
    prev: Option<DateTime<Utc>>,
    result: Option<Result<(), JobError>>,
    entry_id: EntryId,
    fingerprint: Option<Fingerprint>,
    in_flight: usize,
    pending: usize,
}

impl Inner {
    /// Where a finishing (or skipped) execution leaves the job.
    fn resting(&self) -> JobState {
        if self.pending == 0 && self.in_flight <= 1 {
            JobState::Finished
        } else {
            JobState::Idle
        }
    }

    fn finish(&mut self) -> bool {
        if self.pending > 0 || self.in_flight > 0 || self.state == JobState::Finished {
            return false;
        }
        self.last_state = self.state;
        self.state = JobState::Finished;
        true
    }
}

/// A named unit of scheduled work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use jobvisor::{Job, JobError, JobState, DeferredPolicy};
///
/// let job = Job::from_fn("cleanup", |_ctx: CancellationToken| async {
///     Ok::<_, JobError>(())
/// })
/// .with_deferred(DeferredPolicy::Skip);
///
/// assert_eq!(job.name(), "cleanup");
/// assert_eq!(job.state(), JobState::New);
/// assert!(!job.entry_id().is_valid());
/// ```
pub struct Job {
    id: JobId,
    name: Cow<'static, str>,
    runner: RunnerRef,
    deferred: Option<DeferredPolicy>,
    guard: Arc<Semaphore>,
    inner: Mutex<Inner>,
}

impl Job {
    /// Creates a job from a runner.
    pub fn new(name: impl Into<Cow<'static, str>>, runner: RunnerRef) -> Self {
        Self {
            id: JobId::next(),
            name: name.into(),
            runner,
            deferred: None,
            guard: Arc::new(Semaphore::new(1)),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Creates a job from a closure (see [`RunnerFn`]).
    pub fn from_fn<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        Self::new(name, RunnerFn::arc(f))
    }

    /// Overrides the scheduler-wide [`DeferredPolicy`] for this job.
    #[must_use]
    pub fn with_deferred(mut self, policy: DeferredPolicy) -> Self {
        self.deferred = Some(policy);
        self
    }

    /// Wraps the job into a shared handle.
    pub fn into_ref(self) -> JobRef {
        Arc::new(self)
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runner(&self) -> &RunnerRef {
        &self.runner
    }

    /// Per-job deferred policy, if overridden.
    pub fn deferred(&self) -> Option<DeferredPolicy> {
        self.deferred
    }

    pub fn state(&self) -> JobState {
        self.lock().state
    }

    /// Kind of the most recent registration.
    pub fn kind(&self) -> JobKind {
        self.lock().kind
    }

    /// Outcome of the last execution (`None` before the first one).
    pub fn result(&self) -> Option<Result<(), JobError>> {
        self.lock().result.clone()
    }

    pub fn entry_id(&self) -> EntryId {
        self.lock().entry_id
    }

    pub fn run_start(&self) -> Option<DateTime<Utc>> {
        self.lock().run_start
    }

    pub fn run_end(&self) -> Option<DateTime<Utc>> {
        self.lock().run_end
    }

    pub fn next(&self) -> Option<DateTime<Utc>> {
        self.lock().next
    }

    pub fn prev(&self) -> Option<DateTime<Utc>> {
        self.lock().prev
    }

    /// Executions dispatched by the engine and not completed yet.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Consistent copy of every observable field.
    pub fn snapshot(&self) -> JobSnapshot {
        let inner = self.lock();
        JobSnapshot {
            id: self.id,
            name: Arc::from(self.name.as_ref()),
            state: inner.state,
            last_state: inner.last_state,
            kind: inner.kind,
            run_start: inner.run_start,
            run_end: inner.run_end,
            next: inner.next,
            prev: inner.prev,
            result: inner.result.clone(),
            entry_id: inner.entry_id,
        }
    }

    // ---------------------------
    // Crate-internal transitions
    // ---------------------------

    pub(crate) fn set_state(&self, state: JobState) {
        let mut inner = self.lock();
        inner.last_state = inner.state;
        inner.state = state;
    }

    /// Called when the job is registered with an engine entry.
    ///
    /// A job with executions in flight keeps its state: the running execution owns the
    /// next transition and rests the job in `Idle` because this entry is pending.
    pub(crate) fn register(&self, entry_id: EntryId, kind: JobKind, next: Option<DateTime<Utc>>) {
        let mut inner = self.lock();
        inner.entry_id = entry_id;
        inner.kind = kind;
        inner.next = next;
        if next.is_some() {
            inner.pending += 1;
        }
        let busy = inner.in_flight > 0
            || matches!(inner.state, JobState::Running | JobState::ExecutionDeferred);
        if !busy {
            inner.last_state = inner.state;
            inner.state = JobState::Initializing;
        }
    }

    /// An entry fired at `fired`; `next` is its following occurrence (`None` if spent).
    ///
    /// Counts the execution as in flight and, for a spent entry, as no longer pending.
    pub(crate) fn fired(&self, fired: DateTime<Utc>, next: Option<DateTime<Utc>>) {
        let mut inner = self.lock();
        inner.next = next;
        inner.prev = Some(fired);
        inner.in_flight += 1;
        if next.is_none() {
            inner.pending = inner.pending.saturating_sub(1);
        }
    }

    pub(crate) fn begin_run(&self, now: DateTime<Utc>) {
        let mut inner = self.lock();
        inner.run_start = Some(now);
        inner.last_state = inner.state;
        inner.state = JobState::Running;
    }

    pub(crate) fn end_run(&self, now: DateTime<Utc>, result: Result<(), JobError>) {
        let mut inner = self.lock();
        inner.run_end = Some(now);
        inner.result = Some(result);
        inner.last_state = inner.state;
        inner.state = inner.resting();
    }

    /// Restores the resting state after a dropped trigger (nothing ran).
    ///
    /// A no-op unless the job is still `ExecutionDeferred`: a concurrent execution may have
    /// moved it on already.
    pub(crate) fn rest(&self) {
        let mut inner = self.lock();
        if inner.state == JobState::ExecutionDeferred {
            inner.last_state = inner.state;
            inner.state = inner.resting();
        }
    }

    /// An engine entry for this job was removed; `could_fire` is its cached `next.is_some()`.
    ///
    /// Returns `true` if the job moved to `Finished` now. With executions still in flight
    /// the last of them finishes it.
    pub(crate) fn release(&self, could_fire: bool) -> bool {
        let mut inner = self.lock();
        if could_fire {
            inner.pending = inner.pending.saturating_sub(1);
        }
        inner.finish()
    }

    /// Balances [`fired`](Self::fired). Returns `true` if this completion finished the job.
    pub(crate) fn complete(&self) -> bool {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.finish()
    }

    /// Copies the entry's schedule times; `prev` is kept when `None` is passed.
    pub(crate) fn set_times(&self, next: Option<DateTime<Utc>>, prev: Option<DateTime<Utc>>) {
        let mut inner = self.lock();
        inner.next = next;
        if prev.is_some() {
            inner.prev = prev;
        }
    }

    /// Recomputes the fingerprint, stores it, and reports whether it differs from the last one.
    pub(crate) fn changed(&self) -> bool {
        let mut inner = self.lock();
        let fp = Fingerprint::of(&Observed {
            name: &self.name,
            run_start: inner.run_start,
            run_end: inner.run_end,
            next: inner.next,
            prev: inner.prev,
            state: inner.state,
            entry_id: inner.entry_id,
            result: inner.result.as_ref(),
        });
        let changed = inner.fingerprint != Some(fp);
        inner.fingerprint = Some(fp);
        changed
    }

    pub(crate) fn try_guard(&self) -> Result<OwnedSemaphorePermit, TryAcquireError> {
        Arc::clone(&self.guard).try_acquire_owned()
    }

    pub(crate) async fn guard(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.guard).acquire_owned().await.ok()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("state", &inner.state)
            .field("kind", &inner.kind)
            .field("entry_id", &inner.entry_id)
            .finish()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        write!(f, "{}-[{}->{}]", self.name, inner.last_state, inner.state)
    }
}

/// Point-in-time copy of a job's observable fields, carried by events and status reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub name: Arc<str>,
    pub state: JobState,
    /// State before the most recent transition.
    pub last_state: JobState,
    pub kind: JobKind,
    pub run_start: Option<DateTime<Utc>>,
    pub run_end: Option<DateTime<Utc>>,
    pub next: Option<DateTime<Utc>>,
    pub prev: Option<DateTime<Utc>>,
    pub result: Option<Result<(), JobError>>,
    pub entry_id: EntryId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn job() -> Job {
        Job::from_fn("t", |_ctx: CancellationToken| async { Ok(()) })
    }

    #[test]
    fn changed_is_idempotent_without_mutation() {
        let j = job();
        assert!(j.changed(), "first fingerprint always differs from none");
        assert!(!j.changed());
        assert!(!j.changed());
    }

    #[test]
    fn mutation_is_detected() {
        let j = job();
        let _ = j.changed();

        j.set_state(JobState::Running);
        assert!(j.changed());
        assert!(!j.changed());

        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        j.set_times(Some(t + TimeDelta::seconds(1)), None);
        assert!(j.changed());
    }

    #[test]
    fn same_state_twice_is_not_a_change() {
        let j = job();
        j.set_state(JobState::Finished);
        let _ = j.changed();
        j.set_state(JobState::Finished);
        assert!(!j.changed());
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn spent_entry_rests_finished_live_entry_rests_idle() {
        let t = t0();

        let once = job();
        once.register(EntryId::from_raw(1), JobKind::Once, Some(t));
        assert_eq!(once.state(), JobState::Initializing);
        once.fired(t, None);
        once.begin_run(t);
        assert_eq!(once.state(), JobState::Running);
        once.end_run(t + TimeDelta::seconds(1), Ok(()));
        assert_eq!(once.state(), JobState::Finished);
        assert_eq!(once.prev(), Some(t));
        assert_eq!(once.run_end(), Some(t + TimeDelta::seconds(1)));
        assert_eq!(once.result(), Some(Ok(())));
        assert!(!once.complete(), "already finished by the run");

        let rec = job();
        rec.register(EntryId::from_raw(2), JobKind::Recurring, Some(t));
        rec.fired(t, Some(t + TimeDelta::seconds(5)));
        rec.begin_run(t);
        rec.end_run(t, Err(JobError::fail("x")));
        assert_eq!(rec.state(), JobState::Idle);
        assert_eq!(rec.snapshot().last_state, JobState::Running);
        assert!(!rec.complete());
    }

    #[test]
    fn guard_admits_one_holder() {
        let j = job();
        let held = j.try_guard().unwrap();
        assert!(j.try_guard().is_err());
        drop(held);
        assert!(j.try_guard().is_ok());
    }

    #[test]
    fn jobs_have_distinct_ids() {
        let a = job();
        let b = job();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.snapshot().id, a.id());
    }

    #[test]
    fn release_finishes_idle_job_at_once() {
        let j = job();
        j.register(EntryId::from_raw(1), JobKind::Recurring, Some(t0()));
        assert!(j.release(true));
        assert_eq!(j.state(), JobState::Finished);
        assert!(!j.release(false), "already finished");
    }

    #[test]
    fn release_keeps_job_alive_while_another_entry_is_pending() {
        let j = job();
        j.register(EntryId::from_raw(1), JobKind::Recurring, Some(t0()));
        j.register(EntryId::from_raw(2), JobKind::Recurring, Some(t0()));
        assert!(!j.release(true));
        assert_eq!(j.state(), JobState::Initializing);
        assert!(j.release(true));
    }

    #[test]
    fn release_leaves_finish_to_last_in_flight_execution() {
        let t = t0();
        let j = job();
        j.register(EntryId::from_raw(1), JobKind::Recurring, Some(t));

        j.fired(t, Some(t + TimeDelta::seconds(1)));
        j.fired(t + TimeDelta::seconds(1), Some(t + TimeDelta::seconds(2)));
        j.begin_run(t);
        assert!(!j.release(true));
        assert_eq!(j.state(), JobState::Running);

        assert!(!j.complete(), "one execution still in flight");
        j.end_run(t, Ok(()));
        assert_eq!(j.state(), JobState::Finished, "no entry left and last execution");
        assert!(!j.complete());
        assert_eq!(j.in_flight(), 0);
    }

    #[test]
    fn complete_finishes_released_job_left_deferred() {
        let t = t0();
        let j = job();
        j.register(EntryId::from_raw(1), JobKind::Recurring, Some(t));
        j.fired(t, Some(t + TimeDelta::seconds(1)));
        j.set_state(JobState::ExecutionDeferred);
        assert!(!j.release(true));
        assert!(j.complete());
        assert_eq!(j.state(), JobState::Finished);
    }

    #[test]
    fn registering_a_running_job_keeps_its_state() {
        let t = t0();
        let j = job();
        j.register(EntryId::from_raw(1), JobKind::Once, Some(t));
        j.fired(t, None);
        j.begin_run(t);

        j.register(EntryId::from_raw(2), JobKind::Once, Some(t + TimeDelta::seconds(30)));
        assert_eq!(j.state(), JobState::Running);
        assert_eq!(j.entry_id(), EntryId::from_raw(2));

        j.end_run(t + TimeDelta::seconds(10), Ok(()));
        assert_eq!(j.state(), JobState::Idle, "the new entry is still pending");
        assert!(!j.complete());
        assert_eq!(j.state(), JobState::Idle);

        j.fired(t + TimeDelta::seconds(30), None);
        j.begin_run(t + TimeDelta::seconds(30));
        j.end_run(t + TimeDelta::seconds(31), Ok(()));
        assert_eq!(j.state(), JobState::Finished);
    }

    #[test]
    fn rest_only_undoes_deferral() {
        let j = job();
        j.register(EntryId::from_raw(1), JobKind::Recurring, Some(t0()));
        j.set_state(JobState::Running);
        j.rest();
        assert_eq!(j.state(), JobState::Running);
        j.set_state(JobState::ExecutionDeferred);
        j.rest();
        assert_eq!(j.state(), JobState::Idle);
    }

    #[test]
    fn display_shows_transition() {
        let j = job();
        j.set_state(JobState::Running);
        assert_eq!(j.to_string(), "t-[new->running]");
    }
}
