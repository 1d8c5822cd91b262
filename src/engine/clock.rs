use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

/// Wall clock anchored to tokio's monotonic clock.
///
/// `now()` is the wall time at construction plus the tokio time elapsed since, so a paused
/// test runtime (`start_paused = true`) drives schedules in virtual time.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.mono.elapsed())
            .ok()
            .and_then(|d| self.wall.checked_add_signed(d))
            .unwrap_or(self.wall)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
