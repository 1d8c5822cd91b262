//! Execution policies.
//!
//! ## Contents
//! - [`DeferredPolicy`] skip or queue a trigger that hit a held guard or a saturated limiter
//!
//! ## Quick wiring
//! ```text
//! Config { deferred: DeferredPolicy, .. }      (global default)
//! Job::with_deferred(DeferredPolicy)           (per-job override)
//!      └─► core::runner::run_guarded resolves the effective policy per trigger
//! ```

mod deferred;

pub use deferred::DeferredPolicy;
