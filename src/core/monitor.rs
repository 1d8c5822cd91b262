//! # Background loops bound to the runtime token.
//!
//! - **maintenance**: every `state_update_interval`, refresh schedule times and sweep
//!   exhausted entries.
//! - **listener**: forwards bus events to the alive tracker and the subscriber set.
//!
//! Both exit when the runtime token is cancelled.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::runtime::Runtime;
use crate::subscribers::SubscriberSet;

pub(crate) fn spawn_maintenance(rt: Arc<Runtime>) -> JoinHandle<()> {
    let period = rt.cfg.update_interval();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = rt.token.cancelled() => break,
                _ = tick.tick() => {
                    rt.refresh().await;
                    rt.sweep().await;
                }
            }
        }
        tracing::debug!("maintenance loop stopped");
    })
}

/// Subscribes synchronously so no event published after this call is missed.
pub(crate) fn spawn_listener(rt: Arc<Runtime>, set: Arc<SubscriberSet>) -> JoinHandle<()> {
    let mut rx = rt.bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = rt.token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => {
                        rt.alive.update(&ev).await;
                        set.emit(&ev);
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
        // deliver what is already buffered (shutdown outcome events)
        while let Ok(ev) = rx.try_recv() {
            rt.alive.update(&ev).await;
            set.emit(&ev);
        }
    })
}
