//! # Runtime: shared state behind a [`Scheduler`](crate::Scheduler) handle.
//!
//! Owns the engine, the registry, the admission limiter and the event bus, and implements
//! the operations that tie them together: registration, change notification, the sweep of
//! exhausted entries and the refresh of schedule times.
//!
//! ## Wiring
//! ```text
//! Scheduler ──► Runtime::register ──► Engine::schedule(policy, Trigger) + Registry::insert
//!
//! Engine timer ──► Trigger::invoke ──► run_guarded ──► complete ──► sweep
//!                  (Job::fired: times,   (guard, limiter,
//!                   in_flight, pending)   state machine)
//!
//! maintenance loop ──► refresh + sweep        (every state_update_interval)
//! ```
//!
//! ## Rules
//! - Every job transition is followed by [`Runtime::notify`]; only real changes are published.
//! - A job is finished once none of its entries can fire and no execution is in flight,
//!   whichever of removal or completion comes last.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tokio_util::sync::CancellationToken;

use super::alive::AliveTracker;
use super::config::Config;
use super::limiter::Limiter;
use super::registry::{Registry, Table};
use super::runner::run_guarded;
use crate::engine::{Clock, Engine, EntryId, Invoke};
use crate::events::{Bus, Event, EventKind};
use crate::jobs::{JobKind, JobRef};
use crate::schedules::ScheduleRef;

/// Engine-side handle of a registered job.
pub(crate) struct Trigger {
    job: JobRef,
    kind: JobKind,
    rt: Weak<Runtime>,
}

impl Trigger {
    pub(crate) fn job(&self) -> &JobRef {
        &self.job
    }
}

impl Invoke for Trigger {
    fn name(&self) -> &str {
        self.job.name()
    }

    fn bind(&self, id: EntryId, next: Option<DateTime<Utc>>) {
        self.job.register(id, self.kind, next);
    }

    fn invoke(&self, fired: DateTime<Utc>, next: Option<DateTime<Utc>>) -> BoxFuture<'static, ()> {
        self.job.fired(fired, next);
        let job = JobRef::clone(&self.job);
        let Some(rt) = self.rt.upgrade() else {
            job.complete();
            return future::ready(()).boxed();
        };

        async move {
            run_guarded(&rt, &job).await;
            if job.complete() {
                rt.notify(&job);
            }
            rt.sweep().await;
        }
        .boxed()
    }
}

/// Why an entry left the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    Exhausted,
    Debounced,
    Removed,
}

impl Removal {
    fn as_str(&self) -> &'static str {
        match self {
            Removal::Exhausted => "exhausted",
            Removal::Debounced => "debounced",
            Removal::Removed => "removed",
        }
    }
}

pub(crate) struct Runtime {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    pub(crate) token: CancellationToken,
    pub(crate) limiter: Limiter,
    pub(crate) registry: Registry,
    pub(crate) engine: Engine<Trigger>,
    pub(crate) alive: AliveTracker,
}

impl Runtime {
    pub(crate) fn new(cfg: Config, bus: Bus) -> Arc<Self> {
        let limiter = Limiter::new(cfg.concurrency_limit());
        Arc::new(Self {
            cfg,
            bus,
            token: CancellationToken::new(),
            limiter,
            registry: Registry::new(),
            engine: Engine::new(Clock::new()),
            alive: AliveTracker::new(),
        })
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.engine.now()
    }

    /// Publishes `JobChanged` if the job's fingerprint moved since the last call.
    pub(crate) fn notify(&self, job: &JobRef) {
        if job.changed() {
            self.bus
                .publish(Event::for_job(EventKind::JobChanged, job.snapshot()));
        }
    }

    /// Registers `job` under a new engine entry driven by `schedule`.
    pub(crate) async fn register(
        self: &Arc<Self>,
        schedule: ScheduleRef,
        kind: JobKind,
        job: JobRef,
    ) -> EntryId {
        let mut table = self.registry.write().await;
        self.insert(&mut table, schedule, kind, job)
    }

    /// Registration with the registry lock already held.
    pub(crate) fn insert(
        self: &Arc<Self>,
        table: &mut Table,
        schedule: ScheduleRef,
        kind: JobKind,
        job: JobRef,
    ) -> EntryId {
        let trigger = Arc::new(Trigger {
            job: JobRef::clone(&job),
            kind,
            rt: Arc::downgrade(self),
        });
        let id = self.engine.schedule(schedule, trigger);
        table.insert(id, JobRef::clone(&job));

        self.bus
            .publish(Event::for_job(EventKind::JobScheduled, job.snapshot()));
        self.notify(&job);
        id
    }

    /// Removes one entry from engine and registry with the registry lock already held.
    ///
    /// Returns the job that was registered under `id`, if any.
    pub(crate) fn evict(&self, table: &mut Table, id: EntryId, why: Removal) -> Option<JobRef> {
        let removed = self.engine.remove(id);
        let could_fire = removed.as_ref().is_some_and(|e| e.next.is_some());
        let job = table
            .remove(id)
            .or_else(|| removed.map(|e| JobRef::clone(e.job.job())))?;

        job.release(could_fire);
        tracing::debug!(entry = %id, job = job.name(), reason = why.as_str(), "entry evicted");
        self.bus.publish(
            Event::for_job(EventKind::EntryRemoved, job.snapshot())
                .with_entry(id)
                .with_reason(why.as_str()),
        );
        self.notify(&job);
        Some(job)
    }

    /// Removes an entry on behalf of the caller.
    pub(crate) async fn remove(&self, id: EntryId) -> bool {
        let mut table = self.registry.write().await;
        self.evict(&mut table, id, Removal::Removed).is_some()
    }

    /// Removes every entry whose policy reported no further occurrence.
    ///
    /// Decided on the entry's cached `next` (the policy's last answer) so the sweep never
    /// consumes a counting policy.
    pub(crate) async fn sweep(&self) {
        let mut table = self.registry.write().await;
        for entry in self.engine.entries() {
            if entry.next.is_some() {
                continue;
            }
            self.evict(&mut table, entry.id, Removal::Exhausted);
        }
    }

    /// Copies each live entry's `next`/`prev` into its job.
    pub(crate) async fn refresh(&self) {
        let table = self.registry.read().await;
        for entry in self.engine.entries() {
            if let Some(job) = table.get(entry.id) {
                job.set_times(entry.next, entry.prev);
                self.notify(job);
            }
        }
    }

    /// Stops the engine and every loop bound to the runtime token.
    pub(crate) fn stop(&self) {
        self.token.cancel();
        self.engine.stop();
    }
}
