//! # Event subscribers.
//!
//! Two ways to consume runtime events besides a raw [`Scheduler::subscribe`](crate::Scheduler::subscribe)
//! receiver:
//!
//! - **Static subscribers**: [`Subscribe`] implementations passed to the builder. Each one
//!   gets a bounded queue and a worker fed by [`SubscriberSet`].
//! - **Callbacks**: [`Scheduler::on_job_changed`](crate::Scheduler::on_job_changed) returns a
//!   [`Subscription`]; cancel or drop it to unsubscribe.
//!
//! ```text
//! Bus ──► subscriber listener ──► SubscriberSet ──► [queue] ──► worker ──► on_event()
//!   ├───► Subscription listener ──► callback(&JobSnapshot)
//!   └───► Scheduler::subscribe() receivers
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscriber;
mod subscription;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
pub use subscription::Subscription;
