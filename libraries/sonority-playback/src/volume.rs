//! Volume and rate normalization
//!
//! Volume is linear 0.0-1.0, the same scale the media resource takes. Values
//! are normalized here, at the caller boundary, so the transition function can
//! store them as given.

use crate::error::{PlaybackError, Result};

/// Clamp a volume into [0.0, 1.0]
///
/// NaN maps to silence.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Validate a playback rate (finite and > 0)
pub fn validate_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(PlaybackError::InvalidPlaybackRate(rate))
    }
}

/// Validate a seek target (finite and >= 0)
pub fn validate_position(position: f64) -> Result<f64> {
    if position.is_finite() && position >= 0.0 {
        Ok(position)
    } else {
        Err(PlaybackError::InvalidSeekPosition(position))
    }
}

/// Volume actually pushed to the resource
pub fn effective_volume(volume: f64, muted: bool) -> f64 {
    if muted {
        0.0
    } else {
        volume
    }
}
