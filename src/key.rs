//! Derivation of table keys from track identity.
//!
//! Fields are joined verbatim with [`KEY_SEPARATOR`]. Separator sequences that
//! occur inside a field are not escaped, so `("a|+|b", "c")` and
//! `("a", "b|+|c")` collide. Existing tables depend on this exact scheme.

use crate::types::{DrillKey, KEY_SEPARATOR};

/// Key of the drill that applies to a track in every playlist.
pub fn general_key(artist: &str, track: &str) -> DrillKey {
    let mut key = String::with_capacity(artist.len() + KEY_SEPARATOR.len() + track.len());
    key.push_str(artist);
    key.push_str(KEY_SEPARATOR);
    key.push_str(track);
    key
}

/// Key of the drill that applies to a track only within `playlist`.
pub fn scoped_key(artist: &str, track: &str, playlist: &str) -> DrillKey {
    let mut key = general_key(artist, track);
    key.push_str(KEY_SEPARATOR);
    key.push_str(playlist);
    key
}
