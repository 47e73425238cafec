//! Recording broadcast sink for test assertions.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::marketplace::UserId;
use crate::traits::{BroadcastSink, MarketEvent, Notification};

/// Sink that records every delivery for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<RwLock<Vec<MarketEvent>>>,
    notifications: Arc<RwLock<Vec<(UserId, Notification)>>>,
    fail_deliveries: Arc<RwLock<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail, to verify callers swallow sink errors.
    pub async fn set_fail_deliveries(&self, fail: bool) {
        *self.fail_deliveries.write().await = fail;
    }

    /// All broadcast events, in delivery order.
    pub async fn events(&self) -> Vec<MarketEvent> {
        self.events.read().await.clone()
    }

    /// All per-user notifications, in delivery order.
    pub async fn notifications(&self) -> Vec<(UserId, Notification)> {
        self.notifications.read().await.clone()
    }

    /// Notifications addressed to one user.
    pub async fn notifications_for(&self, user: UserId) -> Vec<Notification> {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.notifications.write().await.clear();
    }
}

#[async_trait]
impl BroadcastSink for RecordingSink {
    async fn broadcast(&self, event: &MarketEvent) -> Result<()> {
        if *self.fail_deliveries.read().await {
            bail!("simulated broadcast failure");
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn notify(&self, user: UserId, notification: &Notification) -> Result<()> {
        if *self.fail_deliveries.read().await {
            bail!("simulated notification failure");
        }
        self.notifications
            .write()
            .await
            .push((user, notification.clone()));
        Ok(())
    }
}
