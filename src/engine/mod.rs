//! # Scheduling engine.
//!
//! Decides *when* entries fire; everything about *running* them lives in the core.
//! The engine knows entries only through the [`Invoke`] capability.
//!
//! - [`Engine`] - timer loop, entry table, trigger tracking
//! - `Entry`, [`EntryId`] - entry records and identifiers
//! - [`Clock`] - wall clock that follows tokio time

mod clock;
mod entry;
mod timer;

pub use clock::Clock;
pub use entry::EntryId;
pub use timer::{Engine, Invoke};
