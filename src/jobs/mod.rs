//! # Job abstractions.
//!
//! This module provides the job-related types:
//! - [`Runner`] - trait for the async unit of work
//! - [`RunnerFn`] - closure-backed runner
//! - [`Job`] / [`JobRef`] / [`JobId`] - named runner plus lifecycle state, guard and fingerprint
//! - [`JobState`], [`JobKind`] - lifecycle enums
//! - [`JobSnapshot`] - observable copy carried by events and status reports

mod fingerprint;
mod job;
mod runner;
mod runner_fn;
mod state;

pub use job::{Job, JobId, JobRef, JobSnapshot};
pub use runner::{Runner, RunnerRef};
pub use runner_fn::RunnerFn;
pub use state::{JobKind, JobState};
