//! # Engine: timer loop over scheduled entries.
//!
//! ```text
//! schedule(policy, job) ──► entries (next = policy.next(now)) ──► wake
//!
//! timer loop:
//!   loop {
//!     for entry where next <= now:
//!         prev = next; next = policy.next(now); fut = job.invoke(prev, next)   (under lock)
//!     spawn each fut on the tracker
//!     sleep until earliest next | wake | stop
//!   }
//! ```
//!
//! ## Rules
//! - A policy is consulted once at insertion and once per trigger, never otherwise, so
//!   counting policies are not consumed by inspection.
//! - Exhausted entries (`next == None`) stay listed until someone removes them.
//! - `invoke` and `bind` run under the entries lock; they must not call back into the engine.
//! - Triggered futures run on a [`TaskTracker`]; `drain` waits for them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::clock::Clock;
use super::entry::{Entry, EntryId};
use crate::schedules::ScheduleRef;

/// What an engine entry triggers.
pub trait Invoke: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called once, under the engine lock, when the entry is inserted.
    fn bind(&self, id: EntryId, next: Option<DateTime<Utc>>);

    /// Called under the engine lock when the entry fires at `fired`; `next` is the policy's
    /// new answer.
    ///
    /// Bookkeeping that must be visible before the engine lock is released belongs in the
    /// synchronous part; the returned future is spawned afterwards.
    fn invoke(&self, fired: DateTime<Utc>, next: Option<DateTime<Utc>>) -> BoxFuture<'static, ()>;
}

struct Shared<J> {
    entries: Mutex<Vec<Entry<J>>>,
    next_id: AtomicU64,
    wake: Notify,
    clock: Clock,
    tracker: TaskTracker,
    running: AtomicBool,
    stop: Mutex<Option<CancellationToken>>,
}

/// In-process scheduling engine.
pub struct Engine<J> {
    shared: Arc<Shared<J>>,
}

impl<J: Invoke> Engine<J> {
    pub fn new(clock: Clock) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                wake: Notify::new(),
                clock,
                tracker: TaskTracker::new(),
                running: AtomicBool::new(false),
                stop: Mutex::new(None),
            }),
        }
    }

    /// Current engine time.
    pub fn now(&self) -> DateTime<Utc> {
        self.shared.clock.now()
    }

    /// Adds an entry; the policy is asked for its first occurrence right away.
    pub fn schedule(&self, schedule: ScheduleRef, job: Arc<J>) -> EntryId {
        let id = EntryId::from_raw(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let next = schedule.next(self.now());
        {
            let mut entries = self.shared.lock();
            job.bind(id, next);
            tracing::debug!(entry = %id, job = job.name(), ?next, "entry added");
            entries.push(Entry {
                id,
                next,
                prev: None,
                schedule,
                job,
            });
        }
        self.shared.wake.notify_one();
        id
    }

    /// Removes an entry and returns it as it was at removal (`None` if it was not present).
    ///
    /// The returned `next` is authoritative: no trigger can fire the entry afterwards.
    pub fn remove(&self, id: EntryId) -> Option<Entry<J>> {
        let removed = {
            let mut entries = self.shared.lock();
            let pos = entries.iter().position(|e| e.id == id);
            pos.map(|i| entries.remove(i))
        };
        if removed.is_some() {
            tracing::debug!(entry = %id, "entry removed");
            self.shared.wake.notify_one();
        }
        removed
    }

    /// Snapshot of all entries, in insertion order.
    pub fn entries(&self) -> Vec<Entry<J>> {
        self.shared.lock().clone()
    }

    /// Looks up a single entry.
    pub fn entry(&self, id: EntryId) -> Option<Entry<J>> {
        self.shared.lock().iter().find(|e| e.id == id).cloned()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Spawns the timer loop. A no-op if it is already running.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let token = CancellationToken::new();
        *self
            .shared
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tracing::info!("engine started");
            shared.run(token).await;
            shared.running.store(false, Ordering::Release);
            tracing::info!("engine stopped");
        });
    }

    /// Stops the timer loop. Triggered executions keep running.
    pub fn stop(&self) {
        let token = self
            .shared
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Waits for every triggered execution spawned so far (and any spawned meanwhile).
    pub async fn drain(&self) {
        self.shared.tracker.close();
        self.shared.tracker.wait().await;
    }
}

impl<J: Invoke> Shared<J> {
    fn lock(&self) -> MutexGuard<'_, Vec<Entry<J>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, token: CancellationToken) {
        loop {
            let now = self.clock.now();
            let (due, earliest) = self.fire_due(now);
            for fut in due {
                self.tracker.spawn(fut);
            }

            let wait = earliest.map(|t| (t - self.clock.now()).to_std().unwrap_or(Duration::ZERO));
            match wait {
                Some(d) => tokio::select! {
                    _ = token.cancelled() => break,
                    _ = self.wake.notified() => {}
                    _ = tokio::time::sleep(d) => {}
                },
                None => tokio::select! {
                    _ = token.cancelled() => break,
                    _ = self.wake.notified() => {}
                },
            }
        }
    }

    /// Advances every due entry and returns the futures to spawn plus the earliest
    /// remaining `next`.
    fn fire_due(
        &self,
        now: DateTime<Utc>,
    ) -> (Vec<BoxFuture<'static, ()>>, Option<DateTime<Utc>>) {
        let mut entries = self.lock();
        let mut due = Vec::new();
        for entry in entries.iter_mut() {
            let Some(at) = entry.next else { continue };
            if at > now {
                continue;
            }
            entry.prev = Some(at);
            entry.next = entry.schedule.next(now);
            tracing::trace!(entry = %entry.id, job = entry.job.name(), next = ?entry.next, "entry fired");
            due.push(entry.job.invoke(at, entry.next));
        }
        let earliest = entries.iter().filter_map(|e| e.next).min();
        (due, earliest)
    }
}
