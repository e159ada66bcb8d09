//! Host-provided media resource
//!
//! Abstracts the playable media object (an `HTMLAudioElement` in browsers, a
//! test double in tests). The player owns exactly one resource and drives it
//! through this trait; the resource answers through a [`MediaEventSink`].

use crate::error::ResourceError;
use crate::events::MediaEventSink;
use crate::types::PlayerConfig;

/// Playable media resource
///
/// Implementations must report events asynchronously where the platform does
/// (browsers queue media events as tasks). Re-entrant delivery from inside a
/// method call is tolerated: the player queues it and handles it once the
/// current operation finishes.
pub trait MediaResource {
    /// Replace the event sink; events from here on go to `sink` only
    fn subscribe(&mut self, sink: MediaEventSink);

    /// Assign the source locator, or clear it with `None`
    fn set_source(&mut self, src: Option<&str>);

    /// (Re)start loading the assigned source
    fn load(&mut self);

    /// Request playback
    ///
    /// An immediate refusal is returned as `Err`. A refusal that the platform
    /// decides later is reported as [`MediaEvent::PlayRejected`] through the
    /// sink that was current when `play` was called.
    ///
    /// [`MediaEvent::PlayRejected`]: crate::events::MediaEvent::PlayRejected
    fn play(&mut self) -> Result<(), ResourceError>;

    fn pause(&mut self);

    /// Move the playback position (seconds)
    fn seek(&mut self, position: f64);

    /// Current playback position (seconds)
    fn position(&self) -> f64;

    /// Output volume in [0.0, 1.0]
    fn set_volume(&mut self, volume: f64);

    /// Speed multiplier (> 0)
    fn set_playback_rate(&mut self, rate: f64);
}

/// Creates the media resource for a new player
pub trait ResourceFactory {
    fn create(&self, config: &PlayerConfig) -> Result<Box<dyn MediaResource>, ResourceError>;
}

impl<F> ResourceFactory for F
where
    F: Fn(&PlayerConfig) -> Result<Box<dyn MediaResource>, ResourceError>,
{
    fn create(&self, config: &PlayerConfig) -> Result<Box<dyn MediaResource>, ResourceError> {
        self(config)
    }
}
