//! Error types for the webhook dispatch system.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a connector while dispatching a single webhook.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A required webhook setting is missing
    #[error("Webhook not configured: missing setting \"{0}\"")]
    NotConfigured(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote endpoint answered with a non-success status
    #[error("Remote returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The connector did not finish within the dispatcher's time limit
    #[error("Connector timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The connector panicked
    #[error("Connector panicked: {0}")]
    Panicked(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the webhook store.
///
/// Stations without webhooks are not an error; stores return an empty list.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed
    #[error("Webhook store failed: {0}")]
    Backend(String),
}

/// Configuration errors surfaced to callers of the dispatcher and registry.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No connector is registered under this type name
    #[error("Webhook connector \"{0}\" does not exist")]
    UnknownConnector(String),

    /// Two connectors were registered under the same type name
    #[error("Webhook connector \"{0}\" is registered more than once")]
    DuplicateConnector(String),

    /// The registry has no connector for the reserved local type
    #[error("The local webhook connector is not registered")]
    MissingLocalConnector,

    /// A built-in connector could not be constructed
    #[error("Failed to construct connector: {0}")]
    Connector(#[from] ConnectorError),
}
