//! Station and webhook configuration records.
//!
//! These are owned by the external configuration store; the dispatcher only
//! reads them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::Envelope;

/// Identifier of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u64);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a webhook configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookId(pub u64);

impl fmt::Display for WebhookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A radio station as seen by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// URL-safe name, used for artifact file names
    pub short_name: String,
    /// Most recent cached now-playing snapshot
    #[serde(default)]
    pub now_playing: Value,
}

impl Station {
    /// Create a station with an empty now-playing snapshot.
    pub fn new(id: StationId, name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            short_name: short_name.into(),
            now_playing: Value::Null,
        }
    }

    /// Attach a cached now-playing snapshot.
    #[must_use]
    pub fn with_now_playing(mut self, now_playing: Value) -> Self {
        self.now_playing = now_playing;
        self
    }
}

/// A per-station webhook binding an integration type to its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub id: WebhookId,
    pub station_id: StationId,
    /// Integration type name, resolved against the connector registry
    #[serde(rename = "type")]
    pub webhook_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Triggers this webhook fires on; empty means every trigger
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Integration-specific settings
    #[serde(default)]
    pub settings: Map<String, Value>,
}

const fn default_enabled() -> bool {
    true
}

impl WebhookConfig {
    /// Create an enabled webhook with no trigger filter and no settings.
    pub fn new(
        id: WebhookId,
        station_id: StationId,
        webhook_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            station_id,
            webhook_type: webhook_type.into(),
            name: String::new(),
            enabled: true,
            triggers: Vec::new(),
            settings: Map::new(),
        }
    }

    /// Configuration used for connectors invoked without station settings.
    pub fn unconfigured(station_id: StationId, webhook_type: impl Into<String>) -> Self {
        Self::new(WebhookId(0), station_id, webhook_type)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Look up a non-empty string setting.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Look up an unsigned integer setting, accepting numeric strings.
    pub fn setting_u64(&self, key: &str) -> Option<u64> {
        match self.settings.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Whether this webhook listens for any of the envelope's triggers.
    ///
    /// A webhook with no trigger filter matches every envelope.
    pub fn matches_triggers(&self, envelope: &Envelope) -> bool {
        self.triggers.is_empty() || self.triggers.iter().any(|t| envelope.has_trigger(t))
    }
}
