//! Configuration for the dispatcher and the built-in connectors.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that turns on dry-run mode.
const ENV_DRY_RUN: &str = "WEBHOOKS_DRY_RUN";
/// Environment variable for the per-connector time limit, in seconds.
const ENV_CONNECTOR_TIMEOUT_SECS: &str = "WEBHOOKS_CONNECTOR_TIMEOUT_SECS";
/// Environment variable for the local artifact directory.
const ENV_LOCAL_DIR: &str = "WEBHOOKS_LOCAL_DIR";
/// Environment variable for the default HTTP timeout, in seconds.
const ENV_HTTP_TIMEOUT_SECS: &str = "WEBHOOKS_HTTP_TIMEOUT_SECS";

const DEFAULT_LOCAL_DIR: &str = "./nowplaying";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Dispatcher behavior.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Log and return without touching any connector.
    pub dry_run: bool,
    /// Upper bound on a single connector call. `None` waits indefinitely.
    pub connector_timeout: Option<Duration>,
}

impl DispatcherConfig {
    /// Read the dispatcher configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            dry_run: env::var(ENV_DRY_RUN)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            connector_timeout: env::var(ENV_CONNECTOR_TIMEOUT_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// A configuration that suppresses all connector side effects.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_connector_timeout(mut self, timeout: Duration) -> Self {
        self.connector_timeout = Some(timeout);
        self
    }
}

/// Settings shared by the built-in connectors.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Directory the local connector writes now-playing artifacts to.
    pub local_artifact_dir: PathBuf,
    /// Default timeout for outgoing HTTP requests.
    pub http_timeout: Duration,
    /// User agent sent by HTTP connectors.
    pub user_agent: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            local_artifact_dir: PathBuf::from(DEFAULT_LOCAL_DIR),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: format!("webhooks/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ConnectorConfig {
    /// Read the connector configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            local_artifact_dir: env::var(ENV_LOCAL_DIR)
                .ok()
                .filter(|s| !s.is_empty())
                .map_or(defaults.local_artifact_dir, PathBuf::from),
            http_timeout: env::var(ENV_HTTP_TIMEOUT_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.http_timeout, Duration::from_secs),
            user_agent: defaults.user_agent,
        }
    }
}
