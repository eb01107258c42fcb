//! Webhooks CLI - fire and test station webhooks from a JSON fixture.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use webhooks::{
    triggers, ConnectorConfig, ConnectorRegistry, Dispatcher, DispatcherConfig, Envelope,
    InMemoryWebhookStore, Station, StationId, WebhookConfig, WebhookId,
};

/// Webhooks CLI - dispatch station events to configured integrations.
#[derive(Parser)]
#[command(name = "webhooks")]
#[command(about = "Station webhook dispatcher")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log events without invoking any connector
    #[arg(long, global = true, env = "WEBHOOKS_DRY_RUN")]
    dry_run: bool,

    /// Directory for local now-playing artifacts
    #[arg(long, global = true, env = "WEBHOOKS_LOCAL_DIR")]
    local_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered connector types
    Connectors,

    /// Dispatch an event for a station
    Dispatch {
        /// Fixture file with stations and webhooks
        #[arg(long)]
        fixtures: PathBuf,

        /// Station ID
        #[arg(long)]
        station: u64,

        /// Trigger reasons (defaults to song_changed)
        #[arg(long = "trigger")]
        triggers: Vec<String>,
    },

    /// Send a test dispatch of one webhook and print its log output
    Test {
        /// Fixture file with stations and webhooks
        #[arg(long)]
        fixtures: PathBuf,

        /// Station ID
        #[arg(long)]
        station: u64,

        /// Webhook ID
        #[arg(long)]
        webhook: u64,
    },
}

/// Stations and their webhooks, as stored in a fixture file.
#[derive(Debug, Deserialize)]
struct Fixtures {
    stations: Vec<StationFixture>,
}

#[derive(Debug, Deserialize)]
struct StationFixture {
    #[serde(flatten)]
    station: Station,
    #[serde(default)]
    webhooks: Vec<WebhookConfig>,
}

impl Fixtures {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures from {}", path.display()))?;
        Self::parse(&raw)
            .with_context(|| format!("Failed to parse fixtures in {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    fn station(&self, id: StationId) -> Result<&StationFixture> {
        self.stations
            .iter()
            .find(|s| s.station.id == id)
            .with_context(|| format!("Station {id} not found in fixtures"))
    }

    fn webhook(&self, station: StationId, webhook: WebhookId) -> Result<(Station, WebhookConfig)> {
        let entry = self.station(station)?;
        let Some(config) = entry.webhooks.iter().find(|w| w.id == webhook) else {
            bail!("Webhook {webhook} not found for station {station}");
        };
        Ok((entry.station.clone(), config.clone()))
    }

    fn into_store(self) -> InMemoryWebhookStore {
        InMemoryWebhookStore::from_webhooks(self.stations.into_iter().flat_map(|s| s.webhooks))
    }
}

/// Trigger reasons for a dispatch; a song change when none are requested.
fn dispatch_triggers(requested: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        vec![triggers::SONG_CHANGED.to_string()]
    } else {
        requested
    }
}

/// Run one subcommand, writing its output to `out`.
async fn run<W: Write>(
    command: Commands,
    registry: Arc<ConnectorRegistry>,
    dispatcher_config: DispatcherConfig,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Connectors => {
            for name in registry.names() {
                writeln!(out, "{name}")?;
            }
        }

        Commands::Dispatch {
            fixtures,
            station,
            triggers,
        } => {
            let fixtures = Fixtures::load(&fixtures)?;
            let station = Arc::new(fixtures.station(StationId(station))?.station.clone());
            let triggers = dispatch_triggers(triggers);

            let dispatcher =
                Dispatcher::new(registry, Arc::new(fixtures.into_store()), dispatcher_config)?;

            tracing::info!(
                station_id = %station.id,
                triggers = %triggers.join(", "),
                "Dispatching event"
            );
            dispatcher
                .dispatch(&Envelope::from_station(station, triggers))
                .await;
        }

        Commands::Test {
            fixtures,
            station,
            webhook,
        } => {
            let fixtures = Fixtures::load(&fixtures)?;
            let (station, webhook) = fixtures.webhook(StationId(station), WebhookId(webhook))?;

            let dispatcher =
                Dispatcher::new(registry, Arc::new(fixtures.into_store()), dispatcher_config)?;

            let logs = dispatcher.test_dispatch(&station, &webhook).await?;
            write!(out, "{logs}")?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("webhooks=debug,info")
    } else {
        EnvFilter::new("webhooks=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut connector_config = ConnectorConfig::from_env();
    if let Some(dir) = cli.local_dir {
        connector_config.local_artifact_dir = dir;
    }

    let mut dispatcher_config = DispatcherConfig::from_env();
    dispatcher_config.dry_run |= cli.dry_run;

    let registry = Arc::new(
        ConnectorRegistry::with_defaults(&connector_config)
            .context("Failed to build connector registry")?,
    );

    let mut stdout = std::io::stdout();
    run(cli.command, registry, dispatcher_config, &mut stdout).await
}
