//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by guarded runs, the registry sweep,
//! the scheduler and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `core::runner::run_guarded`, `Runtime::notify`/`sweep`,
//!   `Scheduler` (scheduling, shutdown), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`, updates the
//!   alive tracker), `on_job_changed` subscriptions, raw `Scheduler::subscribe` receivers.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
