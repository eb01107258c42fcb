//! Shared helpers for dispatcher integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use webhooks::{
    Connector, ConnectorError, ConnectorRegistry, Dispatcher, DispatcherConfig, Envelope,
    InMemoryWebhookStore, Station, StationId, StoreError, WebhookConfig, WebhookId,
    WebhookStore, LOCAL_CONNECTOR,
};

/// One connector invocation, as observed by a [`RecordingConnector`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ShouldDispatch { connector: String, webhook: WebhookId },
    Dispatch { connector: String, webhook: WebhookId },
}

/// Ordered log of every call made to the recording connectors of a test.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    /// Webhook IDs that reached `dispatch` on `connector`.
    pub fn dispatched(&self, connector: &str) -> Vec<WebhookId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Dispatch {
                    connector: name,
                    webhook,
                } if name == connector => Some(webhook),
                _ => None,
            })
            .collect()
    }

    pub fn predicate_checks(&self, connector: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(call, Call::ShouldDispatch { connector: name, .. } if name == connector)
            })
            .count()
    }
}

/// What a [`RecordingConnector`] does once dispatched.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    FailFor(WebhookId),
    Panic,
    Sleep(Duration),
}

/// Connector that records its calls and behaves as configured.
pub struct RecordingConnector {
    name: String,
    log: CallLog,
    accept: bool,
    behavior: Behavior,
    envelopes: Mutex<Vec<Envelope>>,
}

impl RecordingConnector {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            accept: true,
            behavior: Behavior::Succeed,
            envelopes: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(mut self) -> Self {
        self.accept = false;
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.envelopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    fn should_dispatch(&self, _envelope: &Envelope, webhook: &WebhookConfig) -> bool {
        self.log.push(Call::ShouldDispatch {
            connector: self.name.clone(),
            webhook: webhook.id,
        });
        self.accept
    }

    async fn dispatch(
        &self,
        envelope: &Envelope,
        webhook: &WebhookConfig,
    ) -> Result<(), ConnectorError> {
        self.log.push(Call::Dispatch {
            connector: self.name.clone(),
            webhook: webhook.id,
        });
        self.envelopes.lock().unwrap().push(envelope.clone());
        tracing::info!(
            connector = %self.name,
            webhook_id = %webhook.id,
            "Recording connector called"
        );

        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(ConnectorError::Other(format!("{} failed", self.name))),
            Behavior::FailFor(id) if id == webhook.id => {
                Err(ConnectorError::Other(format!("{} failed for {id}", self.name)))
            }
            Behavior::FailFor(_) => Ok(()),
            Behavior::Panic => panic!("{} exploded", self.name),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }
}

/// Store whose backend is always down.
pub struct FailingStore;

#[async_trait]
impl WebhookStore for FailingStore {
    async fn station_webhooks(
        &self,
        station: StationId,
    ) -> Result<Vec<WebhookConfig>, StoreError> {
        Err(StoreError::Backend(format!("database unavailable for station {station}")))
    }
}

pub fn station() -> Station {
    Station::new(StationId(1), "Test Radio", "test_radio").with_now_playing(json!({
        "now_playing": {"song": {"text": "Artist - Title"}},
        "listeners": {"current": 3}
    }))
}

pub fn envelope(triggers: &[&str]) -> Envelope {
    Envelope::from_station(Arc::new(station()), triggers.iter().copied())
}

pub fn webhook(id: u64, webhook_type: &str) -> WebhookConfig {
    WebhookConfig::new(WebhookId(id), StationId(1), webhook_type)
}

/// Test fixture holding a dispatcher and its recording local connector.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub local: Arc<RecordingConnector>,
    pub log: CallLog,
}

/// Build a dispatcher with a recording local connector plus `connectors`.
pub fn harness(
    log: CallLog,
    connectors: Vec<(&str, Arc<RecordingConnector>)>,
    webhooks: Vec<WebhookConfig>,
    config: DispatcherConfig,
) -> Harness {
    let local = Arc::new(RecordingConnector::new(LOCAL_CONNECTOR, &log));
    harness_with_local(log, local, connectors, webhooks, config)
}

pub fn harness_with_local(
    log: CallLog,
    local: Arc<RecordingConnector>,
    connectors: Vec<(&str, Arc<RecordingConnector>)>,
    webhooks: Vec<WebhookConfig>,
    config: DispatcherConfig,
) -> Harness {
    let store = Arc::new(InMemoryWebhookStore::from_webhooks(webhooks));
    harness_with_store(log, local, connectors, store, config)
}

/// Build a dispatcher over an arbitrary webhook store.
pub fn harness_with_store(
    log: CallLog,
    local: Arc<RecordingConnector>,
    connectors: Vec<(&str, Arc<RecordingConnector>)>,
    store: Arc<dyn WebhookStore>,
    config: DispatcherConfig,
) -> Harness {
    let mut builder = ConnectorRegistry::builder().register(LOCAL_CONNECTOR, local.clone());
    for (name, connector) in connectors {
        builder = builder.register(name, connector);
    }
    let registry = Arc::new(builder.build().unwrap());
    let dispatcher = Dispatcher::new(registry, store, config).unwrap();

    Harness {
        dispatcher,
        local,
        log,
    }
}
