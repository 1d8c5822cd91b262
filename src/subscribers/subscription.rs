//! # Change-notification callbacks.
//!
//! [`Scheduler::on_job_changed`](crate::Scheduler::on_job_changed) registers a callback
//! that receives a [`JobSnapshot`] every time a job's observable state changes. Any number
//! of callbacks may be registered; each gets its own bus receiver and listener task.
//!
//! ```text
//! Bus ──► listener task ──► filter JobChanged ──► callback(&JobSnapshot)
//!              ▲                                   └─► panic caught → SubscriberPanicked
//!              └── cancelled by Subscription::cancel() / drop
//! ```
//!
//! The receiver is created before `on_job_changed` returns, so no change published after
//! that point is missed (unless the callback lags behind the bus capacity).

use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, EventKind};
use crate::jobs::JobSnapshot;

const LISTENER_NAME: &str = "on_job_changed";

/// Handle to a registered change callback.
///
/// Dropping the handle unsubscribes; use [`detach`](Self::detach) to keep the callback for
/// the lifetime of the scheduler.
#[must_use = "dropping a Subscription unsubscribes the callback"]
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
    armed: bool,
}

impl Subscription {
    pub(crate) fn spawn<F>(bus: &Bus, runtime: CancellationToken, callback: F) -> Self
    where
        F: Fn(&JobSnapshot) + Send + Sync + 'static,
    {
        let mut rx = bus.subscribe();
        let token = runtime.child_token();
        let stop = token.clone();
        let bus = bus.clone();

        tokio::spawn(async move {
            loop {
                let ev = tokio::select! {
                    _ = stop.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => ev,
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "job change listener lagged");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    },
                };
                if ev.kind != EventKind::JobChanged {
                    continue;
                }
                let Some(job) = ev.job.as_deref() else { continue };
                if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| callback(job))) {
                    let info = crate::core::panic_message(&*panic_err);
                    tracing::warn!(job = %job.name, %info, "job change callback panicked");
                    bus.publish(crate::events::Event::subscriber_panicked(LISTENER_NAME, info));
                }
            }
        });

        Self { token, armed: true }
    }

    /// Stops delivering changes to the callback.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Keeps the callback registered until the scheduler stops.
    pub fn detach(mut self) {
        self.armed = false;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.armed {
            self.token.cancel();
        }
    }
}
