//! Playback state and its transition function
//!
//! `PlaybackState` is replaced wholesale on every intent, never mutated in
//! place, so consumers holding a snapshot can compare cheaply. `transition`
//! is pure: the randomness used by shuffle comes from a seed carried in the
//! state itself.

use crate::intent::Intent;
use crate::queue::{dedup_by_id, next_index, position_of, previous_index};
use crate::shuffle::shuffle_tracks;
use crate::types::{PlayerConfig, Playlist, RepeatMode, Track};
use crate::volume::effective_volume;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Snapshot of one player's playback state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Track the resource is (or will be) loaded with
    pub current_track: Option<Track>,

    /// Playlist whose order the queue restores to
    pub current_playlist: Option<Rc<Playlist>>,

    /// Playable order, unique by track id; shared between successive states
    pub queue: Rc<[Track]>,

    /// Transport intent, not the resource's actual readiness
    pub is_playing: bool,

    /// Last known position in seconds
    pub current_time: f64,

    /// Last known length in seconds (0 until metadata loads)
    pub duration: f64,

    pub volume: f64,

    /// Volume to restore when unmuting
    pub previous_volume: f64,

    pub is_muted: bool,

    pub playback_rate: f64,

    pub is_shuffled: bool,

    /// Repeat all; never set together with `is_repeating_one`
    pub is_repeating: bool,

    pub is_repeating_one: bool,

    /// Seed for the next shuffle
    #[serde(default)]
    pub shuffle_seed: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            current_playlist: None,
            queue: Rc::from(Vec::new()),
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            previous_volume: 1.0,
            is_muted: false,
            playback_rate: 1.0,
            is_shuffled: false,
            is_repeating: false,
            is_repeating_one: false,
            shuffle_seed: 0,
        }
    }
}

// Shared queue and playlist compare by pointer first; successive states
// produced by `transition` share them unless the intent replaced them.
impl PartialEq for PlaybackState {
    fn eq(&self, other: &Self) -> bool {
        self.is_playing == other.is_playing
            && self.current_time == other.current_time
            && self.duration == other.duration
            && self.volume == other.volume
            && self.previous_volume == other.previous_volume
            && self.is_muted == other.is_muted
            && self.playback_rate == other.playback_rate
            && self.is_shuffled == other.is_shuffled
            && self.is_repeating == other.is_repeating
            && self.is_repeating_one == other.is_repeating_one
            && self.shuffle_seed == other.shuffle_seed
            && self.current_track == other.current_track
            && shared_eq(&self.queue, &other.queue)
            && match (&self.current_playlist, &other.current_playlist) {
                (Some(a), Some(b)) => shared_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

fn shared_eq<T: PartialEq + ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::ptr_eq(a, b) || **a == **b
}

impl PlaybackState {
    /// Initial state for a freshly mounted player
    pub fn new(config: &PlayerConfig, shuffle_seed: u64) -> Self {
        let config = config.clone().normalized();
        Self {
            volume: config.volume,
            previous_volume: config.volume,
            playback_rate: config.playback_rate,
            shuffle_seed,
            ..Self::default()
        }
    }

    /// Apply an intent, producing the successor state
    pub fn apply(&self, intent: &Intent) -> Self {
        transition(self, intent)
    }

    // ===== Selectors =====

    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.id.as_str())
    }

    /// Index of the current track in the queue
    pub fn current_index(&self) -> Option<usize> {
        position_of(&self.queue, self.current_track_id())
    }

    pub fn is_current_track(&self, track_id: &str) -> bool {
        self.current_track_id() == Some(track_id)
    }

    /// Track that follows the current one, wrapping; `None` for an empty queue
    pub fn next_in_queue(&self) -> Option<&Track> {
        next_index(self.queue.len(), self.current_index()).map(|i| &self.queue[i])
    }

    /// Track that precedes the current one, wrapping; `None` for an empty queue
    pub fn previous_in_queue(&self) -> Option<&Track> {
        previous_index(self.queue.len(), self.current_index()).map(|i| &self.queue[i])
    }

    pub fn has_tracks(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        if self.is_repeating_one {
            RepeatMode::One
        } else if self.is_repeating {
            RepeatMode::All
        } else {
            RepeatMode::Off
        }
    }

    /// Volume the resource should be playing at (0 while muted)
    pub fn effective_volume(&self) -> f64 {
        effective_volume(self.volume, self.is_muted)
    }

    /// Position as a fraction of the duration (0 while unknown)
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Seconds left in the current track
    pub fn remaining(&self) -> f64 {
        (self.duration - self.current_time).max(0.0)
    }

    /// Intents that advance the repeat mode off -> all -> one -> off
    ///
    /// Must be dispatched in order.
    pub fn repeat_cycle_intents(&self) -> Vec<Intent> {
        match self.repeat_mode() {
            RepeatMode::Off => vec![Intent::ToggleRepeat],
            RepeatMode::All => vec![Intent::ToggleRepeat, Intent::ToggleRepeatOne],
            RepeatMode::One => vec![Intent::ToggleRepeatOne],
        }
    }
}

/// Map a state and an intent to the successor state
///
/// Total: every intent yields a defined state, and `Intent::Unknown` returns
/// an unchanged copy. Never mutates `state`.
pub fn transition(state: &PlaybackState, intent: &Intent) -> PlaybackState {
    let mut next = state.clone();

    match intent {
        Intent::SetTrack(track) => {
            change_track(&mut next, track.clone());
        }

        Intent::SetPlaylist(playlist) => {
            let tracks = dedup_by_id(playlist.tracks.clone());

            // The current track always survives a playlist change; when the new
            // list carries the same id we adopt that newer copy.
            if let Some(id) = state.current_track_id() {
                if let Some(fresh) = tracks.iter().find(|t| t.id == id) {
                    next.current_track = Some(fresh.clone());
                }
            }

            next.queue = Rc::from(tracks.clone());
            next.current_playlist = Some(Rc::new(Playlist {
                tracks,
                ..playlist.clone()
            }));
        }

        Intent::Play => next.is_playing = true,

        Intent::Pause => next.is_playing = false,

        Intent::SetVolume(volume) => {
            next.volume = *volume;
            if *volume > 0.0 {
                next.is_muted = false;
            }
        }

        Intent::SetTime(time) => {
            if time.is_finite() {
                next.current_time = clamp_time(*time, state.duration);
            }
        }

        Intent::SetDuration(duration) => {
            let duration = if duration.is_finite() && *duration > 0.0 {
                *duration
            } else {
                0.0
            };
            next.duration = duration;
            next.current_time = clamp_time(state.current_time, duration);
        }

        Intent::SetQueue(tracks) => {
            next.queue = Rc::from(dedup_by_id(tracks.clone()));
        }

        Intent::NextTrack => {
            if let Some(track) = state.next_in_queue() {
                change_track(&mut next, track.clone());
            }
        }

        Intent::PreviousTrack => {
            if let Some(track) = state.previous_in_queue() {
                change_track(&mut next, track.clone());
            }
        }

        Intent::ToggleShuffle => {
            if state.is_shuffled {
                next.is_shuffled = false;
                if let Some(playlist) = &state.current_playlist {
                    next.queue = Rc::from(playlist.tracks.clone());
                }
            } else {
                let (queue, seed) = shuffle_tracks(&state.queue, state.shuffle_seed);
                next.is_shuffled = true;
                next.queue = Rc::from(queue);
                next.shuffle_seed = seed;
            }
        }

        Intent::ToggleRepeat => {
            next.is_repeating = !state.is_repeating;
            next.is_repeating_one = false;
        }

        Intent::ToggleRepeatOne => {
            next.is_repeating_one = !state.is_repeating_one;
            next.is_repeating = false;
        }

        Intent::ToggleMute => {
            if state.is_muted {
                next.volume = state.previous_volume;
                next.is_muted = false;
            } else {
                next.previous_volume = state.volume;
                next.volume = 0.0;
                next.is_muted = true;
            }
        }

        Intent::SetMuted(muted) => match (state.is_muted, *muted) {
            (false, true) => {
                // Keep the last non-zero volume for the restore.
                if state.volume > 0.0 {
                    next.previous_volume = state.volume;
                }
                next.volume = 0.0;
                next.is_muted = true;
            }
            (true, false) => {
                next.volume = state.previous_volume;
                next.is_muted = false;
            }
            _ => {}
        },

        Intent::SetPlaybackRate(rate) => next.playback_rate = *rate,

        Intent::Unknown => {}
    }

    next
}

/// Swap the current track, rewinding; duration is unknown until the new
/// track's metadata arrives
fn change_track(state: &mut PlaybackState, track: Track) {
    if !state.is_current_track(&track.id) {
        state.duration = 0.0;
    }
    state.current_track = Some(track);
    state.current_time = 0.0;
}

fn clamp_time(time: f64, duration: f64) -> f64 {
    let time = time.max(0.0);
    if duration > 0.0 {
        time.min(duration)
    } else {
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(id, format!("/music/{}.mp3", id)).with_title(format!("Track {}", id))
    }

    fn playlist(id: &str, ids: &[&str]) -> Playlist {
        Playlist::new(id, format!("Playlist {}", id), ids.iter().map(|i| track(i)).collect())
    }

    fn queue_ids(state: &PlaybackState) -> Vec<&str> {
        state.queue.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn playlist_then_next_wraps() {
        let state = PlaybackState::default()
            .apply(&Intent::SetPlaylist(playlist("p1", &["T1", "T2", "T3"])));
        assert_eq!(queue_ids(&state), vec!["T1", "T2", "T3"]);

        let state = state.apply(&Intent::SetTrack(track("T2")));
        let state = state.apply(&Intent::NextTrack);
        assert_eq!(state.current_track_id(), Some("T3"));

        let state = state.apply(&Intent::NextTrack);
        assert_eq!(state.current_track_id(), Some("T1"));
    }

    #[test]
    fn set_track_keeps_paused_and_rewinds() {
        let state = PlaybackState {
            current_track: Some(track("T4")),
            current_time: 42.0,
            duration: 180.0,
            ..Default::default()
        };

        let next = state.apply(&Intent::SetTrack(track("T5")));
        assert!(!next.is_playing);
        assert_eq!(next.current_time, 0.0);
        assert_eq!(next.duration, 0.0);
        assert_eq!(next.current_track_id(), Some("T5"));
    }

    #[test]
    fn set_track_keeps_playing() {
        let state = PlaybackState {
            is_playing: true,
            ..Default::default()
        };
        assert!(state.apply(&Intent::SetTrack(track("T1"))).is_playing);
    }

    #[test]
    fn toggle_mute_restores_volume() {
        let state = PlaybackState {
            volume: 0.8,
            ..Default::default()
        };

        let muted = state.apply(&Intent::ToggleMute);
        assert_eq!(muted.volume, 0.0);
        assert!(muted.is_muted);
        assert_eq!(muted.previous_volume, 0.8);

        let unmuted = muted.apply(&Intent::ToggleMute);
        assert_eq!(unmuted.volume, 0.8);
        assert!(!unmuted.is_muted);
    }

    #[test]
    fn next_on_empty_queue_is_noop() {
        let state = PlaybackState::default();
        assert_eq!(state.apply(&Intent::NextTrack), state);
        assert_eq!(state.apply(&Intent::PreviousTrack), state);
    }

    #[test]
    fn missing_current_track_counts_as_minus_one() {
        let state = PlaybackState {
            queue: vec![track("a"), track("b"), track("c")].into(),
            current_track: Some(track("zzz")),
            ..Default::default()
        };

        assert_eq!(state.apply(&Intent::NextTrack).current_track_id(), Some("a"));
        assert_eq!(state.apply(&Intent::PreviousTrack).current_track_id(), Some("c"));

        let unset = PlaybackState {
            current_track: None,
            ..state
        };
        assert_eq!(unset.apply(&Intent::NextTrack).current_track_id(), Some("a"));
        assert_eq!(unset.apply(&Intent::PreviousTrack).current_track_id(), Some("c"));
    }

    #[test]
    fn previous_from_first_wraps_to_last() {
        let state = PlaybackState {
            queue: vec![track("a"), track("b"), track("c")].into(),
            current_track: Some(track("a")),
            is_playing: true,
            current_time: 12.0,
            ..Default::default()
        };

        let prev = state.apply(&Intent::PreviousTrack);
        assert_eq!(prev.current_track_id(), Some("c"));
        assert_eq!(prev.current_time, 0.0);
        assert!(prev.is_playing);
    }

    #[test]
    fn repeat_flags_are_exclusive() {
        let state = PlaybackState::default().apply(&Intent::ToggleRepeat);
        assert!(state.is_repeating);
        assert!(!state.is_repeating_one);

        let state = state.apply(&Intent::ToggleRepeatOne);
        assert!(!state.is_repeating);
        assert!(state.is_repeating_one);

        let state = state.apply(&Intent::ToggleRepeat);
        assert!(state.is_repeating);
        assert!(!state.is_repeating_one);
    }

    #[test]
    fn repeat_cycle_sequence() {
        let mut state = PlaybackState::default();
        let mut seen = Vec::new();

        for _ in 0..4 {
            for intent in state.repeat_cycle_intents() {
                state = state.apply(&intent);
            }
            seen.push(state.repeat_mode());
        }

        assert_eq!(
            seen,
            vec![RepeatMode::All, RepeatMode::One, RepeatMode::Off, RepeatMode::All]
        );
    }

    #[test]
    fn shuffle_on_then_off_restores_playlist_order() {
        let state = PlaybackState {
            shuffle_seed: 1234,
            ..Default::default()
        }
        .apply(&Intent::SetPlaylist(playlist("p", &["a", "b", "c", "d", "e"])));

        let shuffled = state.apply(&Intent::ToggleShuffle);
        assert!(shuffled.is_shuffled);
        assert_ne!(queue_ids(&shuffled), vec!["a", "b", "c", "d", "e"]);
        assert_ne!(shuffled.shuffle_seed, state.shuffle_seed);

        let restored = shuffled.apply(&Intent::ToggleShuffle);
        assert!(!restored.is_shuffled);
        assert_eq!(queue_ids(&restored), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn shuffle_off_without_playlist_keeps_queue() {
        let state = PlaybackState {
            queue: vec![track("x"), track("y"), track("z")].into(),
            shuffle_seed: 5,
            ..Default::default()
        };

        let shuffled = state.apply(&Intent::ToggleShuffle);
        let off = shuffled.apply(&Intent::ToggleShuffle);
        assert_eq!(off.queue, shuffled.queue);
        assert!(!off.is_shuffled);
    }

    #[test]
    fn set_playlist_keeps_current_track() {
        let state = PlaybackState {
            current_track: Some(track("old")),
            ..Default::default()
        };

        let next = state.apply(&Intent::SetPlaylist(playlist("p", &["a", "b"])));
        assert_eq!(next.current_track_id(), Some("old"));
        assert_eq!(queue_ids(&next), vec!["a", "b"]);

        let mut refreshed = playlist("p2", &["b", "old"]);
        refreshed.tracks[1].title = Some("Remastered".to_string());
        let next = state.apply(&Intent::SetPlaylist(refreshed));
        assert_eq!(
            next.current_track.as_ref().and_then(|t| t.title.as_deref()),
            Some("Remastered")
        );
    }

    #[test]
    fn set_playlist_drops_duplicate_ids() {
        let next = PlaybackState::default()
            .apply(&Intent::SetPlaylist(playlist("p", &["a", "b", "a"])));
        assert_eq!(queue_ids(&next), vec!["a", "b"]);
        assert_eq!(next.current_playlist.unwrap().tracks.len(), 2);
    }

    #[test]
    fn set_muted_preserves_last_nonzero_volume() {
        let state = PlaybackState {
            volume: 0.6,
            ..Default::default()
        };

        let muted = state.apply(&Intent::SetMuted(true));
        assert_eq!(muted.volume, 0.0);
        assert_eq!(muted.previous_volume, 0.6);

        // Muting again changes nothing
        assert_eq!(muted.apply(&Intent::SetMuted(true)), muted);

        let unmuted = muted.apply(&Intent::SetMuted(false));
        assert_eq!(unmuted.volume, 0.6);
        assert!(!unmuted.is_muted);

        let silent = PlaybackState {
            volume: 0.0,
            previous_volume: 0.3,
            ..Default::default()
        };
        assert_eq!(silent.apply(&Intent::SetMuted(true)).previous_volume, 0.3);
    }

    #[test]
    fn set_volume_while_muted_unmutes() {
        let muted = PlaybackState {
            volume: 0.5,
            ..Default::default()
        }
        .apply(&Intent::ToggleMute);

        let next = muted.apply(&Intent::SetVolume(0.2));
        assert_eq!(next.volume, 0.2);
        assert!(!next.is_muted);
        assert_eq!(next.effective_volume(), 0.2);

        let still_muted = muted.apply(&Intent::SetVolume(0.0));
        assert!(still_muted.is_muted);
    }

    #[test]
    fn time_update_shares_queue_and_playlist() {
        let state = PlaybackState::default()
            .apply(&Intent::SetPlaylist(playlist("p", &["a", "b", "c"])))
            .apply(&Intent::SetTrack(track("a")));

        let next = state.apply(&Intent::SetTime(4.0));
        assert!(Rc::ptr_eq(&state.queue, &next.queue));
        assert!(Rc::ptr_eq(
            state.current_playlist.as_ref().unwrap(),
            next.current_playlist.as_ref().unwrap()
        ));
        assert_ne!(next, state);

        // Equal content behind different allocations still compares equal
        let requeued = state.apply(&Intent::SetQueue(tracks_of(&["a", "b", "c"])));
        assert!(!Rc::ptr_eq(&state.queue, &requeued.queue));
        assert_eq!(requeued, state);
    }

    fn tracks_of(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| track(id)).collect()
    }

    #[test]
    fn time_is_clamped_to_duration() {
        let state = PlaybackState::default().apply(&Intent::SetTime(30.0));
        assert_eq!(state.current_time, 30.0);

        let state = state.apply(&Intent::SetDuration(20.0));
        assert_eq!(state.duration, 20.0);
        assert_eq!(state.current_time, 20.0);

        let state = state.apply(&Intent::SetTime(-4.0));
        assert_eq!(state.current_time, 0.0);

        let state = state.apply(&Intent::SetTime(f64::NAN));
        assert_eq!(state.current_time, 0.0);

        let state = state.apply(&Intent::SetDuration(f64::INFINITY));
        assert_eq!(state.duration, 0.0);
    }

    #[test]
    fn play_pause_touch_only_transport() {
        let state = PlaybackState {
            queue: vec![track("a")].into(),
            volume: 0.4,
            ..Default::default()
        };

        let playing = state.apply(&Intent::Play);
        assert_eq!(
            playing,
            PlaybackState {
                is_playing: true,
                ..state.clone()
            }
        );
        assert_eq!(playing.apply(&Intent::Pause), state);
    }

    #[test]
    fn unknown_intent_is_noop() {
        let state = PlaybackState {
            queue: vec![track("a")].into(),
            ..Default::default()
        };
        assert_eq!(state.apply(&Intent::Unknown), state);
    }

    #[test]
    fn selectors() {
        let state = PlaybackState {
            queue: vec![track("a"), track("b")].into(),
            current_track: Some(track("b")),
            current_time: 30.0,
            duration: 120.0,
            volume: 0.7,
            is_muted: true,
            ..Default::default()
        };

        assert_eq!(state.current_index(), Some(1));
        assert!(state.is_current_track("b"));
        assert!(!state.is_current_track("a"));
        assert_eq!(state.next_in_queue().map(|t| t.id.as_str()), Some("a"));
        assert_eq!(state.progress(), 0.25);
        assert_eq!(state.remaining(), 90.0);
        assert_eq!(state.effective_volume(), 0.0);
        assert!(state.has_tracks());
    }

    #[test]
    fn new_state_uses_config() {
        let config = PlayerConfig {
            volume: 0.5,
            playback_rate: 1.25,
            ..Default::default()
        };
        let state = PlaybackState::new(&config, 77);
        assert_eq!(state.volume, 0.5);
        assert_eq!(state.previous_volume, 0.5);
        assert_eq!(state.playback_rate, 1.25);
        assert_eq!(state.shuffle_seed, 77);
        assert!(state.current_track.is_none());
    }
}
