//! Generic HTTP callback connector.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::ConnectorConfig;
use crate::error::ConnectorError;
use crate::events::Envelope;
use crate::station::WebhookConfig;

use super::{Connector, GENERIC_CONNECTOR};

/// Setting holding the callback URL.
pub const SETTING_WEBHOOK_URL: &str = "webhook_url";
/// Setting holding the optional basic-auth user name.
pub const SETTING_BASIC_AUTH_USERNAME: &str = "basic_auth_username";
/// Setting holding the optional basic-auth password.
pub const SETTING_BASIC_AUTH_PASSWORD: &str = "basic_auth_password";
/// Setting overriding the request timeout, in seconds.
pub const SETTING_TIMEOUT: &str = "timeout";

/// POSTs the now-playing snapshot as JSON to a configured URL.
pub struct GenericConnector {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl GenericConnector {
    /// Create a connector from the shared connector settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            default_timeout: config.http_timeout,
        })
    }

    fn timeout_for(&self, webhook: &WebhookConfig) -> Duration {
        webhook
            .setting_u64(SETTING_TIMEOUT)
            .filter(|secs| *secs > 0)
            .map_or(self.default_timeout, Duration::from_secs)
    }
}

#[async_trait]
impl Connector for GenericConnector {
    async fn dispatch(
        &self,
        envelope: &Envelope,
        webhook: &WebhookConfig,
    ) -> Result<(), ConnectorError> {
        let webhook_url = webhook
            .setting_str(SETTING_WEBHOOK_URL)
            .ok_or_else(|| ConnectorError::NotConfigured(SETTING_WEBHOOK_URL.to_string()))?;

        let mut request = self
            .client
            .post(webhook_url)
            .timeout(self.timeout_for(webhook))
            .json(envelope.now_playing());

        if let Some(username) = webhook.setting_str(SETTING_BASIC_AUTH_USERNAME) {
            request = request.basic_auth(
                username,
                webhook.setting_str(SETTING_BASIC_AUTH_PASSWORD),
            );
        }

        debug!(
            connector = GENERIC_CONNECTOR,
            webhook_id = %webhook.id,
            url = webhook_url,
            "Sending webhook"
        );

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(
                connector = GENERIC_CONNECTOR,
                webhook_id = %webhook.id,
                status = status.as_u16(),
                "Generic webhook returned code {}",
                status.as_u16()
            );
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();

            warn!(
                connector = GENERIC_CONNECTOR,
                webhook_id = %webhook.id,
                status = %status,
                body = %body,
                "Generic webhook request failed"
            );

            Err(ConnectorError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{StationId, WebhookId};

    #[test]
    fn test_timeout_override() {
        let connector = GenericConnector::new(&ConnectorConfig::default()).unwrap();
        let webhook = WebhookConfig::new(WebhookId(1), StationId(1), GENERIC_CONNECTOR);
        assert_eq!(connector.timeout_for(&webhook), Duration::from_secs(10));

        let webhook = webhook.with_setting(SETTING_TIMEOUT, "2");
        assert_eq!(connector.timeout_for(&webhook), Duration::from_secs(2));

        let webhook = webhook.with_setting(SETTING_TIMEOUT, 0);
        assert_eq!(connector.timeout_for(&webhook), Duration::from_secs(10));
    }
}
