//! Broadcast state-change events handed to the dispatcher.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::station::Station;

/// Trigger reasons attached to an [`Envelope`].
pub mod triggers {
    /// A new track started playing
    pub const SONG_CHANGED: &str = "song_changed";
    /// The listener count went up
    pub const LISTENER_GAINED: &str = "listener_gained";
    /// The listener count went down
    pub const LISTENER_LOST: &str = "listener_lost";
    /// A live streamer connected
    pub const LIVE_CONNECT: &str = "live_connect";
    /// A live streamer disconnected
    pub const LIVE_DISCONNECT: &str = "live_disconnect";

    /// Every known trigger.
    pub const ALL: [&str; 5] = [
        SONG_CHANGED,
        LISTENER_GAINED,
        LISTENER_LOST,
        LIVE_CONNECT,
        LIVE_DISCONNECT,
    ];
}

/// One state change of a station, as seen by every connector.
///
/// Immutable once built. Cloning is cheap; the station and the now-playing
/// snapshot are shared.
#[derive(Debug, Clone)]
pub struct Envelope {
    station: Arc<Station>,
    now_playing: Arc<Value>,
    triggers: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Envelope {
    /// Build an envelope. Duplicate triggers are dropped, keeping the first
    /// occurrence.
    pub fn new<I, S>(station: Arc<Station>, now_playing: Value, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for trigger in triggers {
            let trigger = trigger.into();
            if !unique.contains(&trigger) {
                unique.push(trigger);
            }
        }

        Self {
            station,
            now_playing: Arc::new(now_playing),
            triggers: unique,
            created_at: Utc::now(),
        }
    }

    /// Build an envelope from the station's cached now-playing snapshot.
    pub fn from_station<I, S>(station: Arc<Station>, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now_playing = station.now_playing.clone();
        Self::new(station, now_playing, triggers)
    }

    #[must_use]
    pub fn station(&self) -> &Station {
        &self.station
    }

    /// The now-playing snapshot. Opaque to the dispatcher.
    #[must_use]
    pub fn now_playing(&self) -> &Value {
        &self.now_playing
    }

    #[must_use]
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    #[must_use]
    pub fn has_trigger(&self, trigger: &str) -> bool {
        self.triggers.iter().any(|t| t == trigger)
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
