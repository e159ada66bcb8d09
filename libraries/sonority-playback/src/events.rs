//! Media resource events
//!
//! Events flow from the media resource back into its player:
//! - Metadata ready (duration known)
//! - Time progressed (periodic, at the resource's own cadence)
//! - Playback ended
//! - Resource error
//! - Play request rejected (asynchronous rejection of `play`)

use crate::error::ResourceError;
use std::fmt;
use std::rc::Rc;

/// Lifecycle event reported by a media resource
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Metadata is available
    MetadataLoaded {
        /// Length in seconds; non-finite for unbounded streams
        duration: f64,
    },

    /// Playback position advanced
    TimeUpdate {
        /// Position in seconds
        position: f64,
    },

    /// Reached the end of the source
    Ended,

    /// Decode, network or source failure
    Error(ResourceError),

    /// A pending play request was refused
    PlayRejected(ResourceError),
}

type Deliver = Rc<dyn Fn(u64, MediaEvent)>;

/// Channel a media resource reports its events through
///
/// Each sink is stamped with the binding generation it was handed out for.
/// The binding opens a new generation on every load and every play request;
/// events coming through an older sink are ignored, so a late rejection from
/// a superseded load or play request cannot touch the current playback.
#[derive(Clone)]
pub struct MediaEventSink {
    generation: u64,
    deliver: Deliver,
}

impl MediaEventSink {
    /// Create a sink that hands events to `deliver`
    pub fn new(generation: u64, deliver: impl Fn(u64, MediaEvent) + 'static) -> Self {
        Self {
            generation,
            deliver: Rc::new(deliver),
        }
    }

    /// Report an event
    pub fn emit(&self, event: MediaEvent) {
        (self.deliver)(self.generation, event);
    }

    /// Generation this sink belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for MediaEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaEventSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
