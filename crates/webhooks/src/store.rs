//! Source of per-station webhook configurations.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::station::{StationId, WebhookConfig};

/// Read access to the webhooks configured for a station.
///
/// Implementations must return the webhooks in a stable stored order.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// All webhooks configured for `station`, enabled or not.
    async fn station_webhooks(&self, station: StationId) -> Result<Vec<WebhookConfig>, StoreError>;
}

/// Webhook store kept in process memory.
///
/// Stations without webhooks yield an empty list.
#[derive(Default)]
pub struct InMemoryWebhookStore {
    webhooks: RwLock<HashMap<StationId, Vec<WebhookConfig>>>,
}

impl InMemoryWebhookStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of webhooks, keeping their order per station.
    pub fn from_webhooks(webhooks: impl IntoIterator<Item = WebhookConfig>) -> Self {
        let mut by_station: HashMap<StationId, Vec<WebhookConfig>> = HashMap::new();
        for webhook in webhooks {
            by_station.entry(webhook.station_id).or_default().push(webhook);
        }
        Self {
            webhooks: RwLock::new(by_station),
        }
    }

    /// Append a webhook to its station's list.
    pub async fn insert(&self, webhook: WebhookConfig) {
        self.webhooks
            .write()
            .await
            .entry(webhook.station_id)
            .or_default()
            .push(webhook);
    }

    /// Replace every webhook of a station.
    pub async fn replace_station(&self, station: StationId, webhooks: Vec<WebhookConfig>) {
        self.webhooks.write().await.insert(station, webhooks);
    }
}

#[async_trait]
impl WebhookStore for InMemoryWebhookStore {
    async fn station_webhooks(
        &self,
        station: StationId,
    ) -> Result<Vec<WebhookConfig>, StoreError> {
        Ok(self
            .webhooks
            .read()
            .await
            .get(&station)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::WebhookId;

    #[tokio::test]
    async fn test_unknown_station_has_no_webhooks() {
        let store = InMemoryWebhookStore::new();
        let webhooks = store.station_webhooks(StationId(9)).await.unwrap();
        assert!(webhooks.is_empty());
    }

    #[tokio::test]
    async fn test_insertion_order_is_kept() {
        let store = InMemoryWebhookStore::from_webhooks([
            WebhookConfig::new(WebhookId(2), StationId(1), "generic"),
            WebhookConfig::new(WebhookId(5), StationId(2), "generic"),
        ]);
        store
            .insert(WebhookConfig::new(WebhookId(1), StationId(1), "local"))
            .await;

        let ids: Vec<_> = store
            .station_webhooks(StationId(1))
            .await
            .unwrap()
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![WebhookId(2), WebhookId(1)]);
    }

    #[tokio::test]
    async fn test_replace_station() {
        let store = InMemoryWebhookStore::from_webhooks([WebhookConfig::new(
            WebhookId(1),
            StationId(1),
            "generic",
        )]);
        store.replace_station(StationId(1), Vec::new()).await;

        assert!(store.station_webhooks(StationId(1)).await.unwrap().is_empty());
    }
}
