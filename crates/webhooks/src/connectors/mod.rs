//! Webhook connector implementations.

pub mod generic;
pub mod local;

use async_trait::async_trait;

use crate::error::ConnectorError;
use crate::events::Envelope;
use crate::station::WebhookConfig;

pub use generic::GenericConnector;
pub use local::LocalConnector;

/// Type name of the connector the dispatcher always runs first.
pub const LOCAL_CONNECTOR: &str = "local";

/// Type name of the generic HTTP callback connector.
pub const GENERIC_CONNECTOR: &str = "generic";

/// Trait for webhook integrations (HTTP callbacks, local artifacts, etc.).
#[async_trait]
pub trait Connector: Send + Sync {
    /// Decide whether this webhook should fire for the envelope.
    ///
    /// Must not have side effects. The default fires when the webhook's
    /// trigger filter matches the envelope.
    fn should_dispatch(&self, envelope: &Envelope, webhook: &WebhookConfig) -> bool {
        webhook.matches_triggers(envelope)
    }

    /// Deliver the envelope to the integration.
    async fn dispatch(
        &self,
        envelope: &Envelope,
        webhook: &WebhookConfig,
    ) -> Result<(), ConnectorError>;
}
