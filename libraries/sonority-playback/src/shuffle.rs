//! Seeded queue shuffling
//!
//! The transition function has to stay deterministic, so shuffling draws from
//! a seed stored in the playback state instead of a thread-local RNG. Each
//! shuffle returns the seed to use next time.

use crate::types::Track;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Shuffle `tracks` with a Fisher-Yates pass seeded by `seed`
///
/// With two or more tracks the result never equals the input order; if the
/// draw happens to reproduce it, the result is rotated by one. Returns the
/// permutation and the follow-up seed.
pub fn shuffle_tracks(tracks: &[Track], seed: u64) -> (Vec<Track>, u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shuffled = tracks.to_vec();
    shuffled.shuffle(&mut rng);

    if shuffled.len() >= 2 && same_order(&shuffled, tracks) {
        shuffled.rotate_left(1);
    }

    (shuffled, rng.gen())
}

/// Fresh seed for a new player instance
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}

fn same_order(a: &[Track], b: &[Track]) -> bool {
    a.iter().map(|t| &t.id).eq(b.iter().map(|t| &t.id))
}
