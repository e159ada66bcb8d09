//! Media binding - keeps one media resource in step with the playback state
//!
//! State to resource: after every transition the binding compares the old and
//! new state and issues the matching resource calls (load, play, pause,
//! volume, rate). Resource to state: lifecycle events are translated into
//! follow-up intents for the player to apply.
//!
//! ```text
//! Idle -> NoTrack -> Loading -> ReadyPaused <-> ReadyPlaying
//!                      ^  |
//!                      |  v
//!                    Errored            (any) -> Unbound
//! ```

use crate::error::ResourceError;
use crate::events::{MediaEvent, MediaEventSink};
use crate::intent::Intent;
use crate::resource::MediaResource;
use crate::state::PlaybackState;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Binding state over the media resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingPhase {
    /// No resource created yet
    Idle,

    /// Resource exists, nothing loaded
    NoTrack,

    /// Source assigned and load requested, metadata pending
    Loading,

    /// Metadata loaded, not advancing
    ReadyPaused,

    /// Advancing; time updates are mirrored into the state
    ReadyPlaying,

    /// The resource reported an error
    Errored,

    /// Torn down; the resource has been released
    Unbound,
}

type SinkFactory = Box<dyn Fn(u64) -> MediaEventSink>;
type PlayAnnouncer = Box<dyn Fn()>;

/// Synchronization layer between a player's state and its media resource
pub struct MediaBinding {
    resource: Option<Box<dyn MediaResource>>,
    phase: BindingPhase,

    /// Bumped on every load, play request and teardown; sinks from older
    /// generations are stale
    generation: u64,

    /// Id of the track whose source is assigned to the resource
    bound_track: Option<String>,

    /// One reload per error streak; reset by metadata or a track change
    reload_attempted: bool,

    sink_factory: SinkFactory,

    /// Called right before each play request (registry arbitration)
    announce_play: PlayAnnouncer,
}

impl MediaBinding {
    /// Create an unbound binding
    ///
    /// `sink_factory` builds the event sink for a generation; `announce_play`
    /// runs before every play request sent to the resource.
    pub fn new(
        sink_factory: impl Fn(u64) -> MediaEventSink + 'static,
        announce_play: impl Fn() + 'static,
    ) -> Self {
        Self {
            resource: None,
            phase: BindingPhase::Idle,
            generation: 0,
            bound_track: None,
            reload_attempted: false,
            sink_factory: Box::new(sink_factory),
            announce_play: Box::new(announce_play),
        }
    }

    pub fn phase(&self) -> BindingPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_bound(&self) -> bool {
        self.resource.is_some()
    }

    /// Take ownership of a resource and bring it in line with `state`
    pub fn bind(&mut self, mut resource: Box<dyn MediaResource>, state: &PlaybackState) -> Vec<Intent> {
        self.generation += 1;
        resource.subscribe((self.sink_factory)(self.generation));
        resource.set_volume(state.effective_volume());
        resource.set_playback_rate(state.playback_rate);

        self.resource = Some(resource);
        self.bound_track = None;
        self.set_phase(BindingPhase::NoTrack);

        // Covers a state that already carries a track.
        self.reconcile(state, state)
    }

    /// Apply the difference between two consecutive states to the resource
    ///
    /// Returns follow-up intents (a `Pause` when a play request is refused).
    pub fn reconcile(&mut self, prev: &PlaybackState, next: &PlaybackState) -> Vec<Intent> {
        let mut followups = Vec::new();
        if self.resource.is_none() {
            return followups;
        }

        let next_id = next.current_track_id();
        if next_id != self.bound_track.as_deref() {
            match &next.current_track {
                Some(track) => {
                    self.load(track.id.clone(), &track.src);
                    if next.is_playing {
                        followups.extend(self.request_play());
                    }
                }
                None => self.clear(),
            }
        } else if prev.is_playing != next.is_playing && self.bound_track.is_some() {
            if next.is_playing {
                followups.extend(self.request_play());
            } else {
                self.pause_resource();
            }
        }

        if let Some(resource) = self.resource.as_mut() {
            if prev.effective_volume() != next.effective_volume() {
                resource.set_volume(next.effective_volume());
            }
            if prev.playback_rate != next.playback_rate {
                resource.set_playback_rate(next.playback_rate);
            }
        }

        followups
    }

    /// Translate a resource event into follow-up intents
    ///
    /// Events from a superseded generation are dropped.
    pub fn handle_event(
        &mut self,
        generation: u64,
        event: MediaEvent,
        state: &PlaybackState,
    ) -> Vec<Intent> {
        if generation != self.generation || self.resource.is_none() {
            debug!(
                "Dropping stale media event {:?} (generation {}, current {})",
                event, generation, self.generation
            );
            return Vec::new();
        }

        match event {
            MediaEvent::MetadataLoaded { duration } => {
                self.reload_attempted = false;
                self.set_phase(if state.is_playing {
                    BindingPhase::ReadyPlaying
                } else {
                    BindingPhase::ReadyPaused
                });
                vec![Intent::SetDuration(duration)]
            }

            MediaEvent::TimeUpdate { position } => {
                if self.phase == BindingPhase::ReadyPlaying {
                    vec![Intent::SetTime(position)]
                } else {
                    Vec::new()
                }
            }

            MediaEvent::Ended => self.handle_ended(state),

            MediaEvent::Error(error) => self.handle_error(error, state),

            MediaEvent::PlayRejected(error) => {
                log_rejection(&error);
                vec![Intent::Pause]
            }
        }
    }

    /// Seek the resource; returns the position it reports afterwards
    pub fn seek(&mut self, position: f64) -> Option<f64> {
        let resource = self.resource.as_mut()?;
        resource.seek(position);
        Some(resource.position())
    }

    /// Push a volume straight to the resource
    pub fn set_volume(&mut self, volume: f64) {
        if let Some(resource) = self.resource.as_mut() {
            resource.set_volume(volume);
        }
    }

    /// Push a playback rate straight to the resource
    pub fn set_playback_rate(&mut self, rate: f64) {
        if let Some(resource) = self.resource.as_mut() {
            resource.set_playback_rate(rate);
        }
    }

    /// Pause, clear the source and release the resource
    pub fn unbind(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.pause();
            resource.set_source(None);
        }
        self.generation += 1;
        self.bound_track = None;
        self.set_phase(BindingPhase::Unbound);
    }

    // ===== Internals =====

    fn handle_ended(&mut self, state: &PlaybackState) -> Vec<Intent> {
        if state.is_repeating_one {
            return self.restart(state);
        }

        let mut followups = Vec::new();
        match state.next_in_queue() {
            Some(next) if state.is_repeating => {
                let same = state.is_current_track(&next.id);
                followups.push(Intent::SetTrack(next.clone()));
                // Same id means no reload; replay the ended source instead.
                if same {
                    followups.extend(self.restart(state));
                }
            }
            Some(next) => {
                let same = state.is_current_track(&next.id);
                followups.push(Intent::NextTrack);
                if same {
                    followups.extend(self.restart(state));
                }
            }
            None => followups.push(Intent::Pause),
        }
        followups
    }

    fn handle_error(&mut self, error: ResourceError, state: &PlaybackState) -> Vec<Intent> {
        warn!(
            "Media error on track {:?}: {}",
            self.bound_track.as_deref(),
            error
        );
        self.set_phase(BindingPhase::Errored);

        if self.reload_attempted {
            warn!(
                "Reload did not recover track {:?}; waiting for a track change",
                self.bound_track.as_deref()
            );
            return Vec::new();
        }

        self.reload_attempted = true;
        let Some(resource) = self.resource.as_mut() else {
            return Vec::new();
        };
        resource.load();
        self.set_phase(BindingPhase::Loading);

        if state.is_playing {
            self.request_play().into_iter().collect()
        } else {
            Vec::new()
        }
    }

    /// Open a new generation and hand the resource its sink
    fn resubscribe(&mut self) {
        self.generation += 1;
        let sink = (self.sink_factory)(self.generation);
        if let Some(resource) = self.resource.as_mut() {
            resource.subscribe(sink);
        }
    }

    fn load(&mut self, track_id: String, src: &str) {
        self.resubscribe();
        if let Some(resource) = self.resource.as_mut() {
            resource.set_source(Some(src));
            resource.load();
        }
        debug!("Loading track {} (generation {})", track_id, self.generation);
        self.bound_track = Some(track_id);
        self.reload_attempted = false;
        self.set_phase(BindingPhase::Loading);
    }

    fn clear(&mut self) {
        self.resubscribe();
        if let Some(resource) = self.resource.as_mut() {
            resource.pause();
            resource.set_source(None);
        }
        self.bound_track = None;
        self.set_phase(BindingPhase::NoTrack);
    }

    /// Each request gets its own generation, so the late rejection of a
    /// request superseded by a pause or a newer play is dropped as stale.
    fn request_play(&mut self) -> Option<Intent> {
        (self.announce_play)();
        self.resubscribe();
        let resource = self.resource.as_mut()?;
        match resource.play() {
            Ok(()) => {
                if self.phase == BindingPhase::ReadyPaused {
                    self.set_phase(BindingPhase::ReadyPlaying);
                }
                None
            }
            Err(error) => {
                log_rejection(&error);
                Some(Intent::Pause)
            }
        }
    }

    fn pause_resource(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            resource.pause();
        }
        if self.phase == BindingPhase::ReadyPlaying {
            self.set_phase(BindingPhase::ReadyPaused);
        }
    }

    /// Rewind the same source, replaying when the transport says so
    fn restart(&mut self, state: &PlaybackState) -> Vec<Intent> {
        if let Some(resource) = self.resource.as_mut() {
            resource.seek(0.0);
        }
        if state.is_playing {
            self.request_play().into_iter().collect()
        } else {
            Vec::new()
        }
    }

    fn set_phase(&mut self, phase: BindingPhase) {
        if self.phase != phase {
            debug!("Binding phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

fn log_rejection(error: &ResourceError) {
    if error.is_not_allowed() {
        info!("Playback prevented, waiting for user interaction: {}", error.message);
    } else {
        warn!("Playback error: {}", error);
    }
}

impl fmt::Debug for MediaBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaBinding")
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("bound_track", &self.bound_track)
            .field("reload_attempted", &self.reload_attempted)
            .finish_non_exhaustive()
    }
}
