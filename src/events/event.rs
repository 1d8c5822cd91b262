//! # Runtime events emitted by the scheduler.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Job events**: registration, observable state changes, contained panics, removal
//! - **Subscriber events**: overflow and panics of event consumers
//! - **Shutdown events**: shutdown request and its outcome
//!
//! The [`Event`] struct carries a snapshot of the job (for job events), the engine entry id,
//! a name and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event published through a [`Bus`](crate::events::Bus) gets a sequence number unique
//! to that bus and increasing monotonically. Use `seq` to restore the exact order when
//! events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use jobvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SubscriberOverflow)
//!     .with_name("metrics")
//!     .with_reason("full");
//!
//! assert_eq!(ev.kind, EventKind::SubscriberOverflow);
//! assert_eq!(ev.name.as_deref(), Some("metrics"));
//! assert_eq!(ev.reason.as_deref(), Some("full"));
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::engine::EntryId;
use crate::jobs::JobSnapshot;

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Job events ===
    /// A job was registered with the engine.
    ///
    /// Sets:
    /// - `job`, `name`, `entry`
    JobScheduled,

    /// A job's observable state changed (fingerprint differs from the last one).
    ///
    /// This is the change-notification stream consumed by
    /// [`Scheduler::on_job_changed`](crate::Scheduler::on_job_changed).
    ///
    /// Sets:
    /// - `job`, `name`, `entry`
    JobChanged,

    /// A runner panicked; the panic was contained and recorded as the job result.
    ///
    /// Sets:
    /// - `job`, `name`, `entry`
    /// - `reason`: panic message
    JobPanicked,

    /// An engine entry was removed (exhausted, superseded by debounce, or removed by the caller).
    ///
    /// Sets:
    /// - `job`, `name`, `entry`
    /// - `reason`: `"exhausted"`, `"debounced"` or `"removed"`
    EntryRemoved,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: `"full"` or `"closed"`
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (explicit call or OS signal).
    ShutdownRequested,

    /// All in-flight executions completed within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some executions did not complete in time.
    GraceExceeded,
}

impl EventKind {
    /// Stable snake_case name (logs/metrics).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JobScheduled => "job_scheduled",
            EventKind::JobChanged => "job_changed",
            EventKind::JobPanicked => "job_panicked",
            EventKind::EntryRemoved => "entry_removed",
            EventKind::SubscriberPanicked => "subscriber_panicked",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::ShutdownRequested => "shutdown_requested",
            EventKind::AllStoppedWithin => "all_stopped_within",
            EventKind::GraceExceeded => "grace_exceeded",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: per-bus monotonic sequence (assigned on publish)
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Sequence number assigned by the bus; `0` until published.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: DateTime<Utc>,
    /// Event classification.
    pub kind: EventKind,
    /// Job or subscriber name, if applicable.
    pub name: Option<Arc<str>>,
    /// Engine entry, if applicable.
    pub entry: Option<EntryId>,
    /// Job state at the time the event was created.
    pub job: Option<Arc<JobSnapshot>>,
    /// Human-readable reason (panic message, overflow details, removal cause).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind stamped with the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: Utc::now(),
            kind,
            name: None,
            entry: None,
            job: None,
            reason: None,
        }
    }

    /// Creates a job event; name and entry are taken from the snapshot.
    pub fn for_job(kind: EventKind, job: JobSnapshot) -> Self {
        let mut ev = Self::new(kind);
        ev.name = Some(Arc::clone(&job.name));
        ev.entry = Some(job.entry_id);
        ev.job = Some(Arc::new(job));
        ev
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a job or subscriber name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches an engine entry id.
    #[inline]
    pub fn with_entry(mut self, entry: EntryId) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
