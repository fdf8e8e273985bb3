use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct EventFields {
    pub title: String,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notify_day_before: bool,
    #[serde(default)]
    pub notify_hour_before: bool,
}

/// One tracklist slot: either a catalogue song or a custom title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackItem {
    pub order: u32,
    #[serde(default)]
    pub song_id: Option<Uuid>,
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub custom_artist: Option<String>,
}

/// A validated tracklist slot as stored in `event_track_item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSlot {
    pub position: i32,
    pub song_id: Option<Uuid>,
    pub custom_title: Option<String>,
    pub custom_artist: Option<String>,
}
