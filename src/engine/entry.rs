use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::schedules::ScheduleRef;

/// Identifier the engine assigns to an entry.
///
/// Ids start at 1 and are never reused by the same engine; [`EntryId::INVALID`] (0) marks
/// "not registered".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntryId(u64);

impl EntryId {
    /// The identifier of nothing.
    pub const INVALID: EntryId = EntryId(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One scheduled entry: a policy paired with the thing it triggers.
///
/// `next` is the policy's last answer; `None` means the entry is exhausted and waits for
/// removal. `prev` is the instant of the last trigger.
pub struct Entry<J> {
    pub id: EntryId,
    pub next: Option<DateTime<Utc>>,
    pub prev: Option<DateTime<Utc>>,
    pub schedule: ScheduleRef,
    pub job: Arc<J>,
}

impl<J> Clone for Entry<J> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            next: self.next,
            prev: self.prev,
            schedule: Arc::clone(&self.schedule),
            job: Arc::clone(&self.job),
        }
    }
}

impl<J> fmt::Debug for Entry<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("next", &self.next)
            .field("prev", &self.prev)
            .finish_non_exhaustive()
    }
}
