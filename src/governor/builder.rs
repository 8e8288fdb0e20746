use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::core::Governor;
use crate::{
    config::GovernorConfig,
    error::ConfigError,
    events::Bus,
    lock::LockProvider,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Governor`] with optional features.
pub struct GovernorBuilder {
    cfg: GovernorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl GovernorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: GovernorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive admission and attempt events through dedicated workers with
    /// bounded queues. With subscribers set, [`build`](Self::build) must run inside a
    /// tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and builds the governor.
    ///
    /// This consumes the builder and initializes:
    /// - Event bus for broadcasting
    /// - Subscriber workers and their bus listener (stopped when the governor drops)
    /// - Rotation cursor sized to `max_concurrency`
    pub fn build(self, provider: Arc<dyn LockProvider>) -> Result<Governor, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let set = SubscriberSet::new(self.subscribers, bus.clone());
        let listener = (!set.is_empty()).then(|| subscriber_listener(&bus, set));

        Ok(Governor::new_internal(self.cfg, provider, bus, listener))
    }
}

/// Forwards bus events to the subscriber set until the returned guard is dropped.
fn subscriber_listener(bus: &Bus, set: SubscriberSet) -> DropGuard {
    let token = CancellationToken::new();
    let stop = token.clone();
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind bus");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
        set.shutdown().await;
    });

    token.drop_guard()
}
