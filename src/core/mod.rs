//! Runtime core: guarded execution, admission, registry and lifecycle.
//!
//! The public API from this module is [`Scheduler`] (with its [`SchedulerBuilder`] and
//! [`Config`]). Everything else is wiring behind it.
//!
//! Internal modules:
//! - [`runner`]: one trigger through guard, limiter, state machine and panic boundary;
//! - [`runtime`]: shared state, registration, change notification, sweep and refresh;
//! - [`limiter`]: process-wide admission limiter;
//! - [`registry`]: live jobs by entry id;
//! - [`debounce`]: same-name request collapsing;
//! - [`monitor`]: maintenance loop and subscriber listener;
//! - [`alive`]: running-job tracker for shutdown diagnostics;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod alive;
mod builder;
mod config;
mod debounce;
mod limiter;
mod monitor;
mod registry;
mod runner;
mod runtime;
mod scheduler;
mod shutdown;

pub use builder::SchedulerBuilder;
pub use config::{Config, DEFAULT_POOL_SIZE, DEFAULT_STATE_UPDATE_INTERVAL};
pub use scheduler::{EntryStatus, Scheduler};

pub(crate) use runner::panic_message;
