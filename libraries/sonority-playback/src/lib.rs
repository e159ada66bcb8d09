//! Sonority - Playback Core
//!
//! Playback state machine and media element synchronization for Sonority
//! players.
//!
//! This crate provides:
//! - A pure transition function over an immutable playback state
//! - Queue navigation with wraparound, shuffle and restore
//! - Repeat modes (Off, All, One) and mute with volume restore
//! - A binding that keeps a media resource in step with the state
//! - Single-active-player arbitration across players on one page
//! - Playlist helpers (create, merge, filter, sort, shuffle)
//!
//! # Architecture
//!
//! `sonority-playback` has no dependency on a DOM or UI framework:
//! - The media resource is a trait ([`MediaResource`]) supplied by the host
//! - Rendering layers read [`PlaybackState`] snapshots and dispatch [`Intent`]s
//! - The `wasm` feature adds an `HTMLAudioElement` resource and JS bindings
//!
//! Everything runs on one thread. Resource events are queued per player and
//! applied in arrival order.
//!
//! # Example: Pure Transitions
//!
//! ```rust
//! use sonority_playback::{Intent, PlaybackState, Playlist, Track};
//!
//! let playlist = Playlist::new(
//!     "p1",
//!     "Evening",
//!     vec![
//!         Track::new("t1", "/music/one.mp3"),
//!         Track::new("t2", "/music/two.mp3"),
//!     ],
//! );
//!
//! let state = PlaybackState::default()
//!     .apply(&Intent::SetPlaylist(playlist))
//!     .apply(&Intent::NextTrack);
//!
//! assert_eq!(state.current_track_id(), Some("t1"));
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use sonority_playback::{
//!     Intent, MediaEventSink, MediaResource, PlaybackRegistry, PlayerConfig, PlayerInstance,
//!     ResourceError, Track,
//! };
//!
//! // Implement MediaResource for your platform
//! struct MyAudioElement {
//!     sink: Option<MediaEventSink>,
//!     // ... platform-specific handle
//! }
//!
//! impl MediaResource for MyAudioElement {
//!     fn subscribe(&mut self, sink: MediaEventSink) {
//!         self.sink = Some(sink);
//!     }
//!     fn set_source(&mut self, _src: Option<&str>) {}
//!     fn load(&mut self) {}
//!     fn play(&mut self) -> Result<(), ResourceError> {
//!         Ok(())
//!     }
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _position: f64) {}
//!     fn position(&self) -> f64 {
//!         0.0
//!     }
//!     fn set_volume(&mut self, _volume: f64) {}
//!     fn set_playback_rate(&mut self, _rate: f64) {}
//! }
//!
//! let registry = PlaybackRegistry::shared();
//! let factory = |_: &PlayerConfig| -> Result<Box<dyn MediaResource>, ResourceError> {
//!     Ok(Box::new(MyAudioElement { sink: None }))
//! };
//!
//! let player = PlayerInstance::new(registry, &factory, PlayerConfig::default())?;
//! player.dispatch(Intent::SetTrack(Track::new("t1", "/music/one.mp3")))?;
//! player.dispatch(Intent::Play)?;
//! # Ok::<(), sonority_playback::PlaybackError>(())
//! ```

mod binding;
mod error;
mod events;
mod intent;
pub mod playlist;
mod player;
mod queue;
mod registry;
mod resource;
mod shuffle;
mod state;
pub mod types;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use binding::{BindingPhase, MediaBinding};
pub use error::{PlaybackError, ResourceError, ResourceErrorKind, Result};
pub use events::{MediaEvent, MediaEventSink};
pub use intent::Intent;
pub use player::{ListenerId, PlayerHandle, PlayerId, PlayerInstance};
pub use registry::PlaybackRegistry;
pub use resource::{MediaResource, ResourceFactory};
pub use state::{transition, PlaybackState};
pub use types::{
    CrossOrigin, ImageRef, PlayerConfig, Playlist, PlaylistOrder, Preload, RepeatMode, Track,
};
pub use volume::{clamp_volume, validate_position, validate_rate};
