//! # LogWriter: renders events through `tracing`
//!
//! A minimal subscriber that logs incoming [`Event`]s. Use it for tests or demos;
//! install any `tracing` subscriber (e.g. `tracing-subscriber`'s `fmt`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO jobvisor: [scheduled] job="sync" entry=#1 next=Some(..)
//! INFO jobvisor: [changed] job="sync" running (was initializing)
//! WARN jobvisor: [changed] job="sync" idle (was running) err="execution failed: timeout"
//! ERROR jobvisor: [panicked] job="sync" info="index out of bounds"
//! INFO jobvisor: [removed] job="sync" entry=#1 reason=exhausted
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::jobs::JobState;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let name = e.name.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::JobScheduled => {
                let next = e.job.as_ref().and_then(|j| j.next);
                tracing::info!(target: "jobvisor", "[scheduled] job={name:?} entry={:?} next={next:?}", e.entry);
            }
            EventKind::JobChanged => {
                let Some(job) = e.job.as_deref() else { return };
                match &job.result {
                    Some(Err(err)) if job.state != JobState::Running => {
                        tracing::warn!(
                            target: "jobvisor",
                            "[changed] job={name:?} {} (was {}) err={:?}",
                            job.state, job.last_state, err.to_string()
                        );
                    }
                    _ => {
                        tracing::info!(
                            target: "jobvisor",
                            "[changed] job={name:?} {} (was {})",
                            job.state, job.last_state
                        );
                    }
                }
            }
            EventKind::JobPanicked => {
                tracing::error!(target: "jobvisor", "[panicked] job={name:?} info={reason:?}");
            }
            EventKind::EntryRemoved => {
                tracing::info!(target: "jobvisor", "[removed] job={name:?} entry={:?} reason={reason}", e.entry);
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "jobvisor", "[subscriber-overflow] subscriber={name} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "jobvisor", "[subscriber-panicked] subscriber={name} info={reason}");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "jobvisor", "[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "jobvisor", "[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: "jobvisor", "[grace-exceeded]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
