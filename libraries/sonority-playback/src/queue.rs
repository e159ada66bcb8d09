//! Queue navigation helpers
//!
//! The queue is a plain ordered `Vec<Track>`. Navigation is index based and
//! wraps in both directions. A current track that is not in the queue counts
//! as index -1, so "next" lands on the first track and "previous" on the last.

use crate::types::Track;
use std::collections::HashSet;

/// Index of the track with `track_id` in `queue`
pub fn position_of(queue: &[Track], track_id: Option<&str>) -> Option<usize> {
    let id = track_id?;
    queue.iter().position(|t| t.id == id)
}

/// Index after `current`, wrapping to the start
///
/// Returns `None` for an empty queue.
pub fn next_index(len: usize, current: Option<usize>) -> Option<usize> {
    if len == 0 {
        return None;
    }

    Some(match current {
        Some(index) => (index + 1) % len,
        None => 0,
    })
}

/// Index before `current`, wrapping to the end
///
/// Returns `None` for an empty queue.
pub fn previous_index(len: usize, current: Option<usize>) -> Option<usize> {
    if len == 0 {
        return None;
    }

    Some(match current {
        Some(index) if index > 0 => index - 1,
        _ => len - 1,
    })
}

/// Drop tracks whose id already appeared earlier in the sequence
pub fn dedup_by_id(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = HashSet::with_capacity(tracks.len());
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}
