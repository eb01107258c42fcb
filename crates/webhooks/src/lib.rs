//! Webhook dispatch for station broadcast state changes.
//!
//! This crate notifies integrations whenever a station's broadcast state
//! changes: a new song starts, the listener count moves, a live streamer
//! connects or disconnects.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use webhooks::{
//!     triggers, ConnectorConfig, ConnectorRegistry, Dispatcher, DispatcherConfig, Envelope,
//!     InMemoryWebhookStore, Station, StationId,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ConnectorRegistry::with_defaults(&ConnectorConfig::from_env())?);
//! let store = Arc::new(InMemoryWebhookStore::new());
//! let dispatcher = Dispatcher::new(registry, store, DispatcherConfig::from_env())?;
//!
//! let station = Arc::new(Station::new(StationId(1), "Radio One", "radio_one"));
//! let envelope = Envelope::new(station, serde_json::json!({}), [triggers::SONG_CHANGED]);
//! dispatcher.dispatch(&envelope).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `WEBHOOKS_DRY_RUN`: Set to "true" to log events without dispatching
//! - `WEBHOOKS_CONNECTOR_TIMEOUT_SECS`: Upper bound on a single connector call
//! - `WEBHOOKS_LOCAL_DIR`: Directory for local now-playing artifacts
//! - `WEBHOOKS_HTTP_TIMEOUT_SECS`: Default timeout for HTTP connectors
//!
//! # Architecture
//!
//! - [`Connector`] trait defines the interface for integrations
//! - [`ConnectorRegistry`] maps integration type names to connectors
//! - [`Dispatcher`] runs the local connector, then every matching webhook
//! - [`LogCapture`] scopes log capture to a single test dispatch

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod config;
pub mod connectors;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod registry;
pub mod station;
pub mod store;

pub use capture::{CapturedLogs, LogCapture, LogRecord};
pub use config::{ConnectorConfig, DispatcherConfig};
pub use connectors::{
    Connector, GenericConnector, LocalConnector, GENERIC_CONNECTOR, LOCAL_CONNECTOR,
};
pub use dispatcher::Dispatcher;
pub use error::{ConnectorError, StoreError, WebhookError};
pub use events::{triggers, Envelope};
pub use registry::{ConnectorRegistry, ConnectorRegistryBuilder};
pub use station::{Station, StationId, WebhookConfig, WebhookId};
pub use store::{InMemoryWebhookStore, WebhookStore};
