//! Error types used by the jobvisor runtime and jobs.
//!
//! This module defines three error enums:
//!
//! - [`ScheduleError`]: a schedule request was rejected (returned to the caller, no side effects).
//! - [`JobError`]: a job execution failed (recorded as the job result, never returned).
//! - [`RuntimeError`]: the runtime itself failed to wind down.
//!
//! All types provide `as_label` (stable snake_case, for logs/metrics) and `as_message`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// # Errors produced when a schedule request is rejected.
///
/// Reported synchronously by the [`Scheduler`](crate::Scheduler) methods that can fail.
/// A rejected request never registers anything with the engine or the registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The calendar expression could not be parsed.
    #[error("invalid cron spec {spec:?}: {reason}")]
    InvalidCron {
        /// The rejected expression.
        spec: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The requested absolute instant is not in the future.
    #[error("instant {at} is in the past")]
    InPast {
        /// The rejected instant.
        at: DateTime<Utc>,
    },

    /// A repeat count of zero was requested.
    #[error("repeat count must be at least 1")]
    ZeroRepetitions,
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::ScheduleError;
    ///
    /// assert_eq!(ScheduleError::ZeroRepetitions.as_label(), "schedule_zero_repetitions");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::InvalidCron { .. } => "schedule_invalid_cron",
            ScheduleError::InPast { .. } => "schedule_in_past",
            ScheduleError::ZeroRepetitions => "schedule_zero_repetitions",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ScheduleError::InvalidCron { spec, reason } => format!("cron {spec:?}: {reason}"),
            ScheduleError::InPast { at } => format!("in past: {}", at.to_rfc3339()),
            ScheduleError::ZeroRepetitions => "zero repetitions".to_string(),
        }
    }
}

/// # Errors produced by job execution.
///
/// Captured at the boundary of the guarded run and stored as the job result.
/// They are observable through [`JobSnapshot`](crate::JobSnapshot)s and events only.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The runner returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The runner panicked; the panic was contained.
    #[error("runner panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl JobError {
    /// Shorthand for [`JobError::Fail`].
    ///
    /// # Example
    /// ```
    /// use jobvisor::JobError;
    ///
    /// let err = JobError::fail("disk full");
    /// assert_eq!(err.as_label(), "job_failed");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        JobError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Fail { .. } => "job_failed",
            JobError::Panicked { .. } => "job_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            JobError::Fail { error } => format!("error: {error}"),
            JobError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// True if the failure was a contained panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, JobError::Panicked { .. })
    }
}

/// # Errors produced by the jobvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some executions were still in flight.
    #[error("shutdown timeout {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of jobs still running when the grace period ran out.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; running jobs={stuck:?}")
            }
        }
    }
}
