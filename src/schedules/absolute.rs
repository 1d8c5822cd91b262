use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use super::Schedule;

/// Fires exactly once, at a fixed instant.
///
/// The first call to [`next`](Schedule::next) returns the target, every later call `None`.
/// The engine asks once when the entry is added, so the instant is handed out exactly once
/// no matter how many threads ask afterwards.
///
/// Rejecting instants in the past is the caller's job
/// ([`Scheduler::at`](crate::Scheduler::at) does it); the policy itself just reports the
/// instant, and the engine runs an overdue entry immediately.
#[derive(Debug)]
pub struct AbsoluteOnce {
    at: DateTime<Utc>,
    fired: AtomicBool,
}

impl AbsoluteOnce {
    /// Creates a policy targeting `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            fired: AtomicBool::new(false),
        }
    }

    /// The target instant.
    pub fn target(&self) -> DateTime<Utc> {
        self.at
    }

    /// True once the target has been handed out.
    pub fn is_spent(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl Schedule for AbsoluteOnce {
    fn next(&self, _after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.fired.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(self.at)
        }
    }
}
