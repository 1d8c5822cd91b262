//! # Debounce: collapse repeated requests for the same job name.
//!
//! ```text
//! debounced(delay, job)
//!   └─ registry write lock
//!        ├─ insert AbsoluteOnce(now + delay)
//!        └─ every older entry whose job has the same name ──► evict (EntryRemoved "debounced")
//! ```
//!
//! Only the most recent request survives; it fires `delay` after it was made. Executions
//! already running for a superseded entry are not interrupted. The scan and the
//! re-registration happen under one lock, so two concurrent requests for the same name
//! leave exactly one entry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::runtime::{Removal, Runtime};
use crate::engine::EntryId;
use crate::jobs::{JobKind, JobRef};
use crate::schedules::AbsoluteOnce;

impl Runtime {
    pub(crate) async fn debounce(self: &Arc<Self>, delay: Duration, job: JobRef) -> EntryId {
        let mut table = self.registry.write().await;
        let superseded = table.find_by_name(job.name());

        let delay = TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX);
        let at = self
            .now()
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        // insert first: a job re-debounced with itself never passes through Finished
        let id = self.insert(&mut table, Arc::new(AbsoluteOnce::new(at)), JobKind::Once, job);

        for old in superseded {
            self.evict(&mut table, old, Removal::Debounced);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::events::{Bus, EventKind};
    use crate::jobs::{Job, JobState};
    use tokio_util::sync::CancellationToken;

    fn job(name: &'static str) -> JobRef {
        Arc::new(Job::from_fn(name, |_ctx: CancellationToken| async { Ok(()) }))
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_latest_request_survives() {
        let rt = Runtime::new(Config::default(), Bus::new(64));
        let j = job("deploy");

        let first = rt.debounce(Duration::from_secs(5), JobRef::clone(&j)).await;
        let second = rt.debounce(Duration::from_secs(5), JobRef::clone(&j)).await;

        assert_ne!(first, second);
        assert!(rt.engine.entry(first).is_none());
        assert!(rt.engine.entry(second).is_some());
        assert_eq!(rt.registry.read().await.find_by_name("deploy"), vec![second]);
        assert_eq!(j.entry_id(), second);
        assert_eq!(j.state(), JobState::Initializing, "re-debouncing the same job keeps it live");
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_jobs_with_same_name_are_superseded() {
        let rt = Runtime::new(Config::default(), Bus::new(64));
        let mut rx = rt.bus.subscribe();
        let old = job("build");
        let new = job("build");
        let other = job("lint");

        rt.debounce(Duration::from_secs(5), JobRef::clone(&other)).await;
        let old_id = rt.debounce(Duration::from_secs(5), JobRef::clone(&old)).await;
        rt.debounce(Duration::from_secs(5), JobRef::clone(&new)).await;

        assert_eq!(old.state(), JobState::Finished, "superseded job never runs again");
        assert_eq!(other.state(), JobState::Initializing);
        assert_eq!(rt.registry.read().await.len(), 2);

        let mut removed = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::EntryRemoved {
                removed.push((ev.entry, ev.reason.as_deref().map(str::to_string)));
            }
        }
        assert_eq!(removed, vec![(Some(old_id), Some("debounced".to_string()))]);
    }
}
