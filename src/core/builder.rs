use std::sync::Arc;

use super::config::Config;
use super::monitor;
use super::runtime::Runtime;
use super::scheduler::Scheduler;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Scheduler`] with optional subscribers.
pub struct SchedulerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the scheduler and starts it.
    ///
    /// Initializes the event bus, the subscriber workers, the runtime (engine, registry,
    /// limiter), then spawns the subscriber listener, the maintenance loop and the engine
    /// timer loop. Must be called within a Tokio runtime.
    pub fn build(self) -> Scheduler {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let rt = Runtime::new(self.cfg, bus);

        monitor::spawn_listener(Arc::clone(&rt), subs);
        monitor::spawn_maintenance(Arc::clone(&rt));
        rt.engine.start();

        tracing::info!(
            pool = ?rt.limiter.capacity(),
            self_concurrent = rt.cfg.self_concurrent,
            deferred = ?rt.cfg.deferred,
            "scheduler started"
        );
        Scheduler::from_runtime(rt)
    }
}
