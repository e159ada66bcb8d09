//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Only misuse of the public surface ends up here. Failures reported by the
/// media resource are absorbed by the binding and turned into intents.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Operation on a player instance that has already been disposed
    #[error("Player {player_id} has been disposed")]
    PlayerDisposed { player_id: String },

    /// A handle was used after its player instance went away
    #[error("No active player instance behind this handle")]
    PlayerUnavailable,

    /// A live player with this id is already registered
    #[error("Duplicate player id: {0}")]
    DuplicatePlayerId(String),

    /// Playback rate must be finite and greater than zero
    #[error("Invalid playback rate: {0}")]
    InvalidPlaybackRate(f64),

    /// Seek target must be finite and non-negative
    #[error("Invalid seek position: {0}")]
    InvalidSeekPosition(f64),

    /// The resource factory could not create a media resource
    #[error("Media resource error: {0}")]
    Resource(#[from] ResourceError),
}

/// Category of a media resource failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceErrorKind {
    /// Playback needs a prior user gesture
    NotAllowed,

    /// The source format or locator is not supported
    NotSupported,

    /// Fetching the source failed
    Network,

    /// The source could not be decoded
    Decode,

    /// The operation was superseded (e.g. a new source was assigned)
    Aborted,

    /// Anything else
    Other,
}

/// Failure reported by a media resource
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct ResourceError {
    pub kind: ResourceErrorKind,
    pub message: String,
}

impl ResourceError {
    /// Create a new resource error
    pub fn new(kind: ResourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Playback refused until the user interacts with the page
    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::NotAllowed, message)
    }

    /// Whether this is a user-gesture rejection
    pub fn is_not_allowed(&self) -> bool {
        self.kind == ResourceErrorKind::NotAllowed
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
