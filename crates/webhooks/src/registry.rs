//! Connector Registry - maps integration type names to connectors.
//!
//! The registry is assembled once with [`ConnectorRegistryBuilder`] and is
//! read-only afterwards, so it can be shared across dispatches behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConnectorConfig;
use crate::connectors::{
    Connector, GenericConnector, LocalConnector, GENERIC_CONNECTOR, LOCAL_CONNECTOR,
};
use crate::error::WebhookError;

/// Immutable lookup from integration type name to connector.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Start assembling a registry.
    #[must_use]
    pub fn builder() -> ConnectorRegistryBuilder {
        ConnectorRegistryBuilder::default()
    }

    /// Create a registry with the built-in `local` and `generic` connectors.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Connector`] if a built-in connector cannot be
    /// constructed.
    pub fn with_defaults(config: &ConnectorConfig) -> Result<Self, WebhookError> {
        Self::builder()
            .register(
                LOCAL_CONNECTOR,
                Arc::new(LocalConnector::new(config.local_artifact_dir.clone())),
            )
            .register(GENERIC_CONNECTOR, Arc::new(GenericConnector::new(config)?))
            .build()
    }

    /// Check if a connector is registered under `webhook_type`.
    #[must_use]
    pub fn has(&self, webhook_type: &str) -> bool {
        self.connectors.contains_key(webhook_type)
    }

    /// Get the connector registered under `webhook_type`.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::UnknownConnector`] if no such connector exists.
    pub fn get(&self, webhook_type: &str) -> Result<Arc<dyn Connector>, WebhookError> {
        self.connectors
            .get(webhook_type)
            .cloned()
            .ok_or_else(|| WebhookError::UnknownConnector(webhook_type.to_string()))
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

/// Collects connectors before freezing them into a [`ConnectorRegistry`].
#[derive(Default)]
pub struct ConnectorRegistryBuilder {
    entries: Vec<(String, Arc<dyn Connector>)>,
}

impl ConnectorRegistryBuilder {
    /// Register `connector` under `webhook_type`.
    #[must_use]
    pub fn register(
        mut self,
        webhook_type: impl Into<String>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        self.entries.push((webhook_type.into(), connector));
        self
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::DuplicateConnector`] if a type name was
    /// registered twice.
    pub fn build(self) -> Result<ConnectorRegistry, WebhookError> {
        let mut connectors = HashMap::with_capacity(self.entries.len());
        for (webhook_type, connector) in self.entries {
            if connectors.contains_key(&webhook_type) {
                return Err(WebhookError::DuplicateConnector(webhook_type));
            }
            connectors.insert(webhook_type, connector);
        }
        Ok(ConnectorRegistry { connectors })
    }
}
