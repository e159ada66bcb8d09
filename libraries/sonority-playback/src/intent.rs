//! Playback intents
//!
//! An intent is a named request to transition the playback state. Intents are
//! the only way callers mutate a player's state. The JSON form mirrors the
//! component layer's actions: `{"type": "SET_TRACK", "payload": {...}}`.

use crate::error::Result;
use crate::types::{Playlist, Track};
use crate::volume::{clamp_volume, validate_rate};
use serde::{Deserialize, Serialize};

/// Request to transition the playback state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Replace the current track and rewind; play/pause status is kept
    SetTrack(Track),

    /// Replace the current playlist and the queue with its tracks
    SetPlaylist(Playlist),

    Play,

    Pause,

    /// Volume in [0.0, 1.0]
    SetVolume(f64),

    /// Mirror of the resource's reported position (not a seek command)
    SetTime(f64),

    /// Mirror of the resource's reported duration
    SetDuration(f64),

    /// Replace the queue wholesale
    SetQueue(Vec<Track>),

    NextTrack,

    PreviousTrack,

    ToggleShuffle,

    /// Flip repeat-all, clearing repeat-one
    ToggleRepeat,

    /// Flip repeat-one, clearing repeat-all
    ToggleRepeatOne,

    ToggleMute,

    SetMuted(bool),

    /// Speed multiplier, finite and > 0
    SetPlaybackRate(f64),

    /// Any intent type this version does not know; a no-op
    #[serde(other)]
    Unknown,
}

impl Intent {
    /// Normalize an intent at the caller boundary
    ///
    /// Volume is clamped into [0.0, 1.0]. A playback rate that is not finite
    /// and positive is rejected.
    pub fn normalized(self) -> Result<Self> {
        Ok(match self {
            Intent::SetVolume(volume) => Intent::SetVolume(clamp_volume(volume)),
            Intent::SetPlaybackRate(rate) => Intent::SetPlaybackRate(validate_rate(rate)?),
            other => other,
        })
    }

    /// Parse an intent from its JSON form
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
