use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::{Schedule, aligned_after, whole_seconds};

/// Fires every `delay`, forever.
///
/// The delay is measured from the engine's query after each dispatch, so it is the gap
/// between consecutive triggers, not a wall-clock grid. Rounding follows
/// [`NTimesEvery`](super::NTimesEvery).
#[derive(Debug, Clone, Copy)]
pub struct Every {
    delay: TimeDelta,
}

impl Every {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: whole_seconds(delay),
        }
    }

    /// The effective (rounded) delay.
    pub fn delay(&self) -> TimeDelta {
        self.delay
    }
}

impl Schedule for Every {
    fn next(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        aligned_after(after, self.delay)
    }
}
