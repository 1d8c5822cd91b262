//! # Scheduler configuration.
//!
//! Provides [`Config`] centralized settings for one [`Scheduler`](crate::Scheduler)
//! instance, consumed by [`Scheduler::builder`](crate::Scheduler::builder).
//!
//! ## Sentinel values
//! - `pool_size = 0` → default pool size ([`DEFAULT_POOL_SIZE`])
//! - `unbounded = true` → no admission limiter at all
//! - `state_update_interval = 0s` → default interval ([`DEFAULT_STATE_UPDATE_INTERVAL`])

use std::time::Duration;

use crate::policies::DeferredPolicy;

/// Admission limiter capacity used when `pool_size` is `0`.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Maintenance interval used when `state_update_interval` is zero.
pub const DEFAULT_STATE_UPDATE_INTERVAL: Duration = Duration::from_secs(15);

/// Configuration for the scheduler runtime.
///
/// ## Field semantics
/// - `pool_size`: admission limiter capacity (`0` = default 10)
/// - `unbounded`: disables the admission limiter
/// - `self_concurrent`: allows overlapping executions of the same job
/// - `state_update_interval`: period of the maintenance loop (refresh + sweep)
/// - `deferred`: what a contended trigger does (can be overridden per job)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `grace`: maximum wait for in-flight executions in [`Scheduler::shutdown`](crate::Scheduler::shutdown)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling sentinel
/// checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of jobs executing at once, across all jobs.
    ///
    /// - `0` = [`DEFAULT_POOL_SIZE`]
    /// - `n > 0` = at most `n` executions run simultaneously
    pub pool_size: usize,

    /// Disables the admission limiter (`pool_size` is then ignored).
    pub unbounded: bool,

    /// Allows a job to run while a previous execution of the same job is still running.
    ///
    /// When `false` (default) a per-job guard serializes executions.
    pub self_concurrent: bool,

    /// Period of the maintenance loop that refreshes `next`/`prev` and sweeps exhausted entries.
    pub state_update_interval: Duration,

    /// Default handling of triggers that hit a busy guard or a saturated limiter.
    pub deferred: DeferredPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe `Lagged` and skip
    /// older items.
    pub bus_capacity: usize,

    /// Maximum time [`Scheduler::shutdown`](crate::Scheduler::shutdown) waits for in-flight
    /// executions before returning `RuntimeError::GraceExceeded`.
    pub grace: Duration,
}

impl Config {
    /// Returns the admission limit as an `Option`.
    ///
    /// - `None` → unbounded (no semaphore)
    /// - `Some(n)` → at most `n` concurrent executions
    ///
    /// # Example
    /// ```
    /// use jobvisor::Config;
    ///
    /// let mut cfg = Config::default();
    /// assert_eq!(cfg.concurrency_limit(), Some(10));
    ///
    /// cfg.pool_size = 0;
    /// assert_eq!(cfg.concurrency_limit(), Some(10));
    ///
    /// cfg.unbounded = true;
    /// assert_eq!(cfg.concurrency_limit(), None);
    /// ```
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.unbounded {
            return None;
        }
        match self.pool_size {
            0 => Some(DEFAULT_POOL_SIZE),
            n => Some(n),
        }
    }

    /// Returns the maintenance interval, substituting the default for zero.
    #[inline]
    pub fn update_interval(&self) -> Duration {
        if self.state_update_interval.is_zero() {
            DEFAULT_STATE_UPDATE_INTERVAL
        } else {
            self.state_update_interval
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `pool_size = 10`
    /// - `unbounded = false`
    /// - `self_concurrent = false`
    /// - `state_update_interval = 15s`
    /// - `deferred = DeferredPolicy::Queue`
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            unbounded: false,
            self_concurrent: false,
            state_update_interval: DEFAULT_STATE_UPDATE_INTERVAL,
            deferred: DeferredPolicy::default(),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_falls_back_to_default() {
        let cfg = Config {
            state_update_interval: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.update_interval(), Duration::from_secs(15));
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert!(!cfg.self_concurrent);
        assert_eq!(cfg.deferred, DeferredPolicy::Queue);
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
        assert_eq!(Config { bus_capacity: 0, ..cfg }.bus_capacity_clamped(), 1);
    }
}
