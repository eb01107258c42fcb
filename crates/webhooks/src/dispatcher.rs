//! Webhook dispatcher.
//!
//! Dispatch happens in two phases. The local connector always runs first,
//! with no station settings. Then every enabled webhook of the station is
//! offered to its connector, in stored order, and fired when the connector's
//! predicate accepts it. Failures never escape a single webhook.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::capture::{CapturedLogs, LogCapture};
use crate::config::DispatcherConfig;
use crate::connectors::{Connector, LOCAL_CONNECTOR};
use crate::error::{ConnectorError, WebhookError};
use crate::events::{triggers, Envelope};
use crate::registry::ConnectorRegistry;
use crate::station::{Station, WebhookConfig};
use crate::store::WebhookStore;

/// Routes station events to their configured connectors.
pub struct Dispatcher {
    registry: Arc<ConnectorRegistry>,
    store: Arc<dyn WebhookStore>,
    local: Arc<dyn Connector>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::MissingLocalConnector`] if the registry has no
    /// `local` connector.
    pub fn new(
        registry: Arc<ConnectorRegistry>,
        store: Arc<dyn WebhookStore>,
        config: DispatcherConfig,
    ) -> Result<Self, WebhookError> {
        let local = registry
            .get(LOCAL_CONNECTOR)
            .map_err(|_| WebhookError::MissingLocalConnector)?;

        Ok(Self {
            registry,
            store,
            local,
            config,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatch an event to the local connector and the station's webhooks.
    ///
    /// Errors are logged and never returned.
    pub async fn dispatch(&self, envelope: &Envelope) {
        let station_id = envelope.station().id;

        if self.config.dry_run {
            info!(%station_id, "Dry-run mode; no webhooks dispatched");
            return;
        }

        let local_config = WebhookConfig::unconfigured(station_id, LOCAL_CONNECTOR);
        if let Err(e) = self.invoke(self.local.as_ref(), envelope, &local_config).await {
            error!(
                %station_id,
                webhook_type = LOCAL_CONNECTOR,
                error = %e,
                "Local webhook dispatch failed"
            );
        }

        let webhooks = match self.store.station_webhooks(station_id).await {
            Ok(webhooks) => webhooks,
            Err(e) => {
                error!(%station_id, error = %e, "Failed to load station webhooks");
                return;
            }
        };

        let enabled: Vec<WebhookConfig> = webhooks.into_iter().filter(|w| w.enabled).collect();
        if enabled.is_empty() {
            return;
        }

        debug!(
            %station_id,
            triggers = %envelope.triggers().join(", "),
            "Triggering events"
        );

        for webhook in &enabled {
            self.dispatch_webhook(envelope, webhook).await;
        }
    }

    /// Spawn [`dispatch`](Self::dispatch) onto the runtime and return
    /// immediately.
    pub fn dispatch_detached(self: &Arc<Self>, envelope: Envelope) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.dispatch(&envelope).await;
        })
    }

    async fn dispatch_webhook(&self, envelope: &Envelope, webhook: &WebhookConfig) {
        let station_id = envelope.station().id;
        let webhook_type = webhook.webhook_type.as_str();

        if webhook_type == LOCAL_CONNECTOR {
            debug!(
                %station_id,
                webhook_id = %webhook.id,
                "Local connector already ran; skipping configured webhook"
            );
            return;
        }

        let connector = match self.registry.get(webhook_type) {
            Ok(connector) => connector,
            Err(e) => {
                error!(
                    %station_id,
                    webhook_id = %webhook.id,
                    webhook_type,
                    "{e}; skipping."
                );
                return;
            }
        };

        if !connector.should_dispatch(envelope, webhook) {
            debug!(
                %station_id,
                webhook_id = %webhook.id,
                webhook_type,
                "Connector declined event"
            );
            return;
        }

        debug!(
            %station_id,
            webhook_id = %webhook.id,
            webhook_type,
            "Dispatching connector \"{webhook_type}\"."
        );

        match self.invoke(connector.as_ref(), envelope, webhook).await {
            Ok(()) => {
                debug!(%station_id, webhook_id = %webhook.id, webhook_type, "Webhook dispatched");
            }
            Err(e) => {
                error!(
                    %station_id,
                    webhook_id = %webhook.id,
                    webhook_type,
                    error = %e,
                    "Webhook dispatch failed"
                );
            }
        }
    }

    /// Send a test dispatch of one webhook, regardless of whether it is
    /// enabled or would match, and return the log output it produced.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::UnknownConnector`] if the webhook's type is not
    /// registered. No connector is invoked in that case.
    pub async fn test_dispatch(
        &self,
        station: &Station,
        webhook: &WebhookConfig,
    ) -> Result<CapturedLogs, WebhookError> {
        let connector = self.get_connector(&webhook.webhook_type)?;
        let envelope = Envelope::from_station(Arc::new(station.clone()), triggers::ALL);

        let ((), logs) = LogCapture::default()
            .run(async {
                info!(
                    station_id = %station.id,
                    webhook_id = %webhook.id,
                    webhook_type = %webhook.webhook_type,
                    "Sending test dispatch"
                );

                match self.invoke(connector.as_ref(), &envelope, webhook).await {
                    Ok(()) => info!(webhook_id = %webhook.id, "Test dispatch completed"),
                    Err(e) => error!(webhook_id = %webhook.id, error = %e, "Test dispatch failed"),
                }
            })
            .await;

        Ok(logs)
    }

    /// Directly access the connector registered for `webhook_type`.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::UnknownConnector`] if no such connector exists.
    pub fn get_connector(&self, webhook_type: &str) -> Result<Arc<dyn Connector>, WebhookError> {
        self.registry.get(webhook_type)
    }

    /// Run one connector call, turning panics and timeouts into errors.
    async fn invoke(
        &self,
        connector: &dyn Connector,
        envelope: &Envelope,
        webhook: &WebhookConfig,
    ) -> Result<(), ConnectorError> {
        let call = AssertUnwindSafe(connector.dispatch(envelope, webhook)).catch_unwind();

        let outcome = match self.config.connector_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(ConnectorError::TimedOut(limit)),
            },
            None => call.await,
        };

        outcome.unwrap_or_else(|panic| Err(ConnectorError::Panicked(panic_message(panic.as_ref()))))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
