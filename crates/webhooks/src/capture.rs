//! Scoped log capture for test dispatches.
//!
//! [`LogCapture::run`] attaches a dedicated `tracing` subscriber to a single
//! future. The subscriber is only active while that future is polled, so it
//! is detached on every exit path, and records emitted by other tasks are
//! never captured.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// One captured log record.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:>5} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.message
        )?;
        for (key, value) in &self.fields {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Records captured during one scoped call.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    records: Vec<LogRecord>,
}

impl CapturedLogs {
    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Records formatted one per line.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.records.iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether any record at `level` contains `needle` in its message.
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    #[must_use]
    pub fn into_records(self) -> Vec<LogRecord> {
        self.records
    }
}

impl fmt::Display for CapturedLogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}

/// A capturing log sink scoped to one future.
#[derive(Debug, Clone)]
pub struct LogCapture {
    level: LevelFilter,
}

impl Default for LogCapture {
    fn default() -> Self {
        Self {
            level: LevelFilter::DEBUG,
        }
    }
}

impl LogCapture {
    /// Capture records at `level` and above.
    #[must_use]
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Run `future` with the capture attached, returning its output and the
    /// records it emitted.
    pub async fn run<F>(&self, future: F) -> (F::Output, CapturedLogs)
    where
        F: Future,
    {
        let records = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry()
            .with(CaptureLayer {
                records: Arc::clone(&records),
            })
            .with(self.level);

        let output = future.with_subscriber(subscriber).await;

        let records =
            std::mem::take(&mut *records.lock().unwrap_or_else(PoisonError::into_inner));
        (output, CapturedLogs { records })
    }
}

/// Layer pushing every event into a shared buffer.
struct CaptureLayer {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Utc::now(),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        };

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}
