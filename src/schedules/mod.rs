//! # Time policies consulted by the engine.
//!
//! A [`Schedule`] answers one question: given the engine's current time, when should
//! the entry fire next? `None` means "no further occurrence"; the engine then parks the
//! entry and the next sweep removes it.
//!
//! ## Policies
//! | Policy          | Fires                                   | Exhausts            |
//! |-----------------|-----------------------------------------|---------------------|
//! | [`OnceNow`]     | immediately (`now - 1s`)                | after the first call|
//! | [`AbsoluteOnce`]| at a fixed instant                      | after the first call|
//! | [`NTimesEvery`] | `now + delay`, second-aligned           | after `n` calls     |
//! | [`Every`]       | `now + delay`, second-aligned           | never               |
//! | [`CronSchedule`]| next calendar match                     | when the calendar ends |
//!
//! ## Rules
//! - **Monotonic exhaustion**: once `next` returned `None`, every later call returns `None`.
//! - **Concurrent-safe**: the engine may query from its timer loop while other tasks read
//!   entries; all policies keep their counters in atomics.
//! - **Opaque state**: counters are private; the only way to advance a policy is `next`.

mod absolute;
mod calendar;
mod every;
mod n_times;
mod once_now;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

pub use absolute::AbsoluteOnce;
pub use calendar::CronSchedule;
pub use every::Every;
pub use n_times::NTimesEvery;
pub use once_now::OnceNow;

/// Longest delay a second-aligned policy accepts (100 years); longer delays are clamped.
const MAX_DELAY_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// # "When to fire next" capability.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use jobvisor::schedules::{Schedule, OnceNow};
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let once = OnceNow::new();
///
/// assert!(once.next(now).unwrap() < now); // already due
/// assert_eq!(once.next(now), None);         // exhausted
/// ```
pub trait Schedule: Send + Sync + 'static {
    /// Returns the next fire time strictly derived from `after`, or `None` when exhausted.
    fn next(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// Shared handle to a time policy.
pub type ScheduleRef = Arc<dyn Schedule>;

/// Rounds a delay the way all second-aligned policies do: below one second becomes one
/// second, sub-second remainders are truncated.
pub(crate) fn whole_seconds(delay: Duration) -> TimeDelta {
    let secs = delay.as_secs().clamp(1, MAX_DELAY_SECS);
    TimeDelta::seconds(secs as i64)
}

/// `after + delay` with the sub-second part of `after` zeroed.
pub(crate) fn aligned_after(after: DateTime<Utc>, delay: TimeDelta) -> Option<DateTime<Utc>> {
    let nanos = TimeDelta::nanoseconds(i64::from(after.timestamp_subsec_nanos()));
    after
        .checked_sub_signed(nanos)?
        .checked_add_signed(delay)
}
