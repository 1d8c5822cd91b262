use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::{Schedule, aligned_after, whole_seconds};

/// Fires `n` times, `delay` apart, then exhausts.
///
/// - Delays below one second are raised to one second; sub-second remainders are
///   truncated once, here, so repeated calls never drift.
/// - Each occurrence is `now + delay` with the query time's sub-second part zeroed.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use chrono::{TimeZone, Utc};
/// use jobvisor::schedules::{NTimesEvery, Schedule};
///
/// let p = NTimesEvery::new(2, Duration::from_millis(1500));
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
///
/// assert_eq!(p.next(t), Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap()));
/// assert_eq!(p.remaining(), 1);
/// assert!(p.next(t).is_some());
/// assert_eq!(p.next(t), None);
/// ```
#[derive(Debug)]
pub struct NTimesEvery {
    remaining: AtomicU32,
    delay: TimeDelta,
}

impl NTimesEvery {
    /// Creates a policy firing `times` times with the given delay.
    pub fn new(times: u32, delay: Duration) -> Self {
        Self {
            remaining: AtomicU32::new(times),
            delay: whole_seconds(delay),
        }
    }

    /// Occurrences not yet handed out.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// The effective (rounded) delay.
    pub fn delay(&self) -> TimeDelta {
        self.delay
    }
}

impl Schedule for NTimesEvery {
    fn next(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()?;
        aligned_after(after, self.delay)
    }
}
