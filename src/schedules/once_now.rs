use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

use super::Schedule;

/// Fires once, immediately.
///
/// The single occurrence is reported one second *before* the query time so the engine
/// treats the entry as already due.
#[derive(Debug, Default)]
pub struct OnceNow {
    fired: AtomicBool,
}

impl OnceNow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Schedule for OnceNow {
    fn next(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.fired.swap(true, Ordering::AcqRel) {
            return None;
        }
        after.checked_sub_signed(TimeDelta::seconds(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn first_call_is_one_second_in_the_past() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap();
        let p = OnceNow::new();
        assert_eq!(
            p.next(now),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 9).unwrap())
        );
    }

    #[test]
    fn exhausts_after_first_call() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap();
        let p = OnceNow::new();
        let _ = p.next(now);
        assert_eq!(p.next(now), None);
        assert_eq!(p.next(now + TimeDelta::hours(1)), None);
    }
}
