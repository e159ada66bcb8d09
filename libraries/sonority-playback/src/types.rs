//! Core types for playback management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Artwork reference attached to a track or playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image locator
    pub src: String,

    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A single playable item
///
/// Two tracks are the same track iff their `id` matches; every other field is
/// display data. Tracks are treated as immutable once placed in a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Identifier, unique within a queue
    pub id: String,

    /// Locator for the playable asset
    pub src: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,

    /// Duration hint in seconds, before the resource reports the real value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Custom display attributes
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Track {
    /// Create a track with only identity and source set
    pub fn new(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            title: None,
            description: None,
            artist: None,
            album: None,
            written_by: None,
            copyright: None,
            genre: None,
            year: None,
            date_added: None,
            image: None,
            duration: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_date_added(mut self, date_added: DateTime<Utc>) -> Self {
        self.date_added = Some(date_added);
        self
    }

    /// Attach a custom attribute
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Identity comparison
    pub fn same_track(&self, other: &Track) -> bool {
        self.id == other.id
    }
}

/// Ordering hint carried by a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaylistOrder {
    /// Title, ascending
    Asc,

    /// Title, descending
    Desc,

    /// Oldest first
    DateAdded,

    Artist,

    Copyright,

    WrittenBy,
}

/// Named, ordered collection of tracks
///
/// The track sequence is the canonical queue order, restored when shuffle is
/// turned off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<PlaylistOrder>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,

    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Playlist {
    /// Create a playlist
    pub fn new(id: impl Into<String>, name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            order: None,
            image: None,
            tracks,
        }
    }

    /// Whether a track with this id is part of the playlist
    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == track_id)
    }
}

/// Repeat mode, derived from the two repeat flags of the playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatMode {
    /// Queue wraps but nothing is forced
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

/// Preload hint given to the media resource on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Preload {
    None,
    Metadata,
    Auto,
}

/// CORS mode given to the media resource on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    Anonymous,
    UseCredentials,
}

/// Configuration for a player instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Initial volume (0.0-1.0, default: 1.0)
    pub volume: f64,

    /// Initial playback rate (default: 1.0)
    pub playback_rate: f64,

    /// Preload hint (default: auto)
    pub preload: Preload,

    /// CORS mode (default: anonymous)
    pub cross_origin: Option<CrossOrigin>,

    /// Seed for queue shuffling; random per instance when absent
    pub shuffle_seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            playback_rate: 1.0,
            preload: Preload::Auto,
            cross_origin: Some(CrossOrigin::Anonymous),
            shuffle_seed: None,
        }
    }
}

impl PlayerConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Self>(json).map(Self::normalized)
    }

    /// Clamp volume and replace an unusable playback rate
    pub fn normalized(mut self) -> Self {
        self.volume = crate::volume::clamp_volume(self.volume);
        if crate::volume::validate_rate(self.playback_rate).is_err() {
            self.playback_rate = 1.0;
        }
        self
    }
}
