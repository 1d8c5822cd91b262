use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use super::Schedule;
use crate::error::ScheduleError;

/// Calendar-expression policy backed by the `cron` crate.
///
/// Accepted forms:
/// - standard 5-field specs (`min hour dom month dow`), fired at second 0,
/// - 6/7-field specs with a leading seconds field (and optional trailing year),
/// - descriptors such as `@hourly`, `@daily`, `@weekly`, `@monthly`, `@yearly`.
///
/// Day-of-week numbering follows the `cron` crate (1 = Sunday); names (`MON`, `Fri`)
/// avoid the ambiguity.
pub struct CronSchedule {
    spec: String,
    inner: cron::Schedule,
    ended: AtomicBool,
}

impl CronSchedule {
    /// Parses a calendar expression.
    ///
    /// # Example
    /// ```
    /// use jobvisor::schedules::CronSchedule;
    ///
    /// assert!(CronSchedule::parse("*/5 * * * *").is_ok());
    /// assert!(CronSchedule::parse("0 30 9 * * Mon-Fri").is_ok());
    /// assert!(CronSchedule::parse("@daily").is_ok());
    /// assert!(CronSchedule::parse("every tuesday").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self, ScheduleError> {
        let trimmed = spec.trim();
        let normalized = if trimmed.split_whitespace().count() == 5 {
            format!("0 {trimmed}")
        } else {
            trimmed.to_string()
        };

        let inner =
            cron::Schedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCron {
                spec: spec.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            spec: spec.to_string(),
            inner,
            ended: AtomicBool::new(false),
        })
    }

    /// The expression as given by the caller.
    pub fn spec(&self) -> &str {
        &self.spec
    }
}

impl std::fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronSchedule").field("spec", &self.spec).finish()
    }
}

impl Schedule for CronSchedule {
    fn next(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.ended.load(Ordering::Acquire) {
            return None;
        }
        let next = self.inner.after(&after).next();
        if next.is_none() {
            self.ended.store(true, Ordering::Release);
        }
        next
    }
}
