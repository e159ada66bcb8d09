//! Playlist helpers
//!
//! Pure functions over [`Playlist`] values. None of them touch a player; feed
//! the result to `Intent::SetPlaylist` to make it current.

use crate::types::{Playlist, PlaylistOrder, Track};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Name given to the result of [`merge_playlists`]
pub const MERGED_PLAYLIST_NAME: &str = "Merged Playlist";

/// Build a playlist with a generated id
pub fn create_playlist(tracks: Vec<Track>, name: Option<&str>) -> Playlist {
    Playlist {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.map(str::to_string),
        order: None,
        image: None,
        tracks,
    }
}

/// Concatenate the tracks of several playlists into a new one
///
/// Duplicates are kept; the queue drops them when the playlist is applied.
pub fn merge_playlists(playlists: &[Playlist]) -> Playlist {
    let tracks = playlists
        .iter()
        .flat_map(|playlist| playlist.tracks.iter().cloned())
        .collect();
    create_playlist(tracks, Some(MERGED_PLAYLIST_NAME))
}

/// Keep only the tracks matching `predicate`
pub fn filter_playlist(playlist: &Playlist, predicate: impl Fn(&Track) -> bool) -> Playlist {
    Playlist {
        tracks: playlist
            .tracks
            .iter()
            .filter(|track| predicate(track))
            .cloned()
            .collect(),
        ..playlist.clone()
    }
}

/// Sort the tracks and record the order on the playlist
///
/// The sort is stable. Tracks missing the sort key go last, in their
/// original relative order.
pub fn sort_playlist(playlist: &Playlist, order: PlaylistOrder) -> Playlist {
    let mut tracks = playlist.tracks.clone();
    match order {
        PlaylistOrder::Asc => tracks.sort_by(|a, b| by_key(&a.title, &b.title)),
        PlaylistOrder::Desc => tracks.sort_by(|a, b| by_key_desc(&a.title, &b.title)),
        PlaylistOrder::DateAdded => tracks.sort_by(|a, b| by_key(&a.date_added, &b.date_added)),
        PlaylistOrder::Artist => tracks.sort_by(|a, b| by_key(&a.artist, &b.artist)),
        PlaylistOrder::Copyright => tracks.sort_by(|a, b| by_key(&a.copyright, &b.copyright)),
        PlaylistOrder::WrittenBy => tracks.sort_by(|a, b| by_key(&a.written_by, &b.written_by)),
    }

    Playlist {
        tracks,
        order: Some(order),
        ..playlist.clone()
    }
}

/// Uniformly shuffle the tracks
pub fn shuffle_playlist<R: Rng + ?Sized>(playlist: &Playlist, rng: &mut R) -> Playlist {
    let mut tracks = playlist.tracks.clone();
    tracks.shuffle(rng);
    Playlist {
        tracks,
        ..playlist.clone()
    }
}

fn by_key<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn by_key_desc<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        _ => by_key(a, b),
    }
}
