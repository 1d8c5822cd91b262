//! # Running-job tracker with sequence-based ordering.
//!
//! Maintains which jobs are currently executing, using event sequence numbers to handle
//! out-of-order delivery. Used by [`Scheduler::shutdown`](crate::Scheduler::shutdown) to
//! name the jobs still running when the grace period runs out.
//!
//! ```text
//! Bus ──► subscriber listener ──► AliveTracker::update()
//!                                        │
//!                                        ▼
//!                             HashMap<JobId, {name, seq, running}>
//! ```
//!
//! ## Rules
//! - Only `JobChanged` events change the running flag (`state == Running`).
//! - Jobs are keyed by [`JobId`]; distinct jobs sharing a name are tracked apart.
//! - Events with `seq <= last_seq` for the same job are rejected (stale).
//! - Reads are eventually consistent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::jobs::{JobId, JobState};

#[derive(Debug, Clone)]
struct Seen {
    name: Arc<str>,
    last_seq: u64,
    running: bool,
}

pub(crate) struct AliveTracker {
    state: RwLock<HashMap<JobId, Seen>>,
}

impl AliveTracker {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Applies an event; returns `true` if the running flag was updated.
    pub(crate) async fn update(&self, ev: &Event) -> bool {
        if ev.kind != EventKind::JobChanged {
            return false;
        }
        let Some(job) = ev.job.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let seen = state.entry(job.id).or_insert_with(|| Seen {
            name: Arc::clone(&job.name),
            last_seq: 0,
            running: false,
        });
        if ev.seq <= seen.last_seq {
            return false;
        }
        seen.last_seq = ev.seq;
        seen.running = job.state == JobState::Running;
        true
    }

    /// Sorted, deduplicated names of jobs last seen running.
    pub(crate) async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut running: Vec<String> = state
            .values()
            .filter(|s| s.running)
            .map(|s| s.name.to_string())
            .collect();
        running.sort_unstable();
        running.dedup();
        running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Job;
    use chrono::Utc;
    use tokio_util::sync::CancellationToken;

    fn changed(job: &Job, seq: u64) -> Event {
        let mut ev = Event::for_job(EventKind::JobChanged, job.snapshot());
        ev.seq = seq;
        ev
    }

    #[tokio::test]
    async fn stale_events_are_rejected() {
        let tracker = AliveTracker::new();
        let job = Job::from_fn("sync", |_ctx: CancellationToken| async { Ok(()) });

        job.begin_run(Utc::now());
        let running = changed(&job, 5);
        job.end_run(Utc::now(), Ok(()));
        let idle = changed(&job, 6);

        assert!(tracker.update(&idle).await);
        assert!(!tracker.update(&running).await, "older than last seen");
        assert!(tracker.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn running_jobs_are_reported() {
        let tracker = AliveTracker::new();
        let a = Job::from_fn("a", |_ctx: CancellationToken| async { Ok(()) });
        let b = Job::from_fn("b", |_ctx: CancellationToken| async { Ok(()) });
        b.begin_run(Utc::now());
        a.begin_run(Utc::now());

        tracker.update(&changed(&b, 1)).await;
        tracker.update(&changed(&a, 2)).await;
        assert!(!tracker.update(&Event::new(EventKind::ShutdownRequested)).await);
        assert_eq!(tracker.snapshot().await, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn same_name_jobs_are_tracked_apart() {
        let tracker = AliveTracker::new();
        let long = Job::from_fn("sync", |_ctx: CancellationToken| async { Ok(()) });
        let short = Job::from_fn("sync", |_ctx: CancellationToken| async { Ok(()) });

        long.begin_run(Utc::now());
        short.begin_run(Utc::now());
        tracker.update(&changed(&long, 1)).await;
        tracker.update(&changed(&short, 2)).await;

        short.end_run(Utc::now(), Ok(()));
        assert!(tracker.update(&changed(&short, 3)).await);
        assert_eq!(tracker.snapshot().await, vec!["sync".to_string()]);

        long.end_run(Utc::now(), Ok(()));
        assert!(tracker.update(&changed(&long, 4)).await);
        assert!(tracker.snapshot().await.is_empty());
    }
}
