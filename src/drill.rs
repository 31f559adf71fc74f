//! Drill record and draft types.

use serde::{Deserialize, Serialize};

use crate::{
    key::{general_key, scoped_key},
    types::{DrillKey, SCOPE_NO, SCOPE_YES},
};

/// Number of fields in the legacy positional encoding of a [`DrillRecord`].
pub const LEGACY_FIELD_COUNT: usize = 5;

/// Practice note attached to a track, optionally limited to one playlist.
///
/// Serializes as the legacy five-string sequence
/// `[artist, track, notes, playlist, "YES"|"NO"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct DrillRecord {
    /// Artist of the track.
    pub artist_name: String,
    /// Title of the track.
    pub track_name: String,
    /// Free text, may span several lines.
    pub notes: String,
    /// Playlist the note was written under. Kept for general records too.
    pub playlist_title: String,
    /// True when the note only applies within `playlist_title`.
    pub scoped_to_playlist: bool,
}

impl DrillRecord {
    /// Key under which this record belongs in a table.
    pub fn key(&self) -> DrillKey {
        if self.scoped_to_playlist {
            scoped_key(&self.artist_name, &self.track_name, &self.playlist_title)
        } else {
            general_key(&self.artist_name, &self.track_name)
        }
    }

    /// Positional legacy encoding.
    pub fn to_legacy_fields(&self) -> [String; LEGACY_FIELD_COUNT] {
        let scope = if self.scoped_to_playlist {
            SCOPE_YES
        } else {
            SCOPE_NO
        };
        [
            self.artist_name.clone(),
            self.track_name.clone(),
            self.notes.clone(),
            self.playlist_title.clone(),
            scope.to_string(),
        ]
    }
}

/// Reason a positional field list is not a valid [`DrillRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacyFieldsError {
    /// Wrong number of fields.
    #[error("expected 5 drill fields, found {0}")]
    FieldCount(usize),
    /// Scope flag is neither `YES` nor `NO`.
    #[error("invalid playlist scope flag {0:?}")]
    ScopeFlag(String),
}

impl TryFrom<Vec<String>> for DrillRecord {
    type Error = LegacyFieldsError;

    fn try_from(fields: Vec<String>) -> Result<Self, Self::Error> {
        let count = fields.len();
        let Ok([artist_name, track_name, notes, playlist_title, scope]) =
            <[String; LEGACY_FIELD_COUNT]>::try_from(fields)
        else {
            return Err(LegacyFieldsError::FieldCount(count));
        };
        let scoped_to_playlist = match scope.as_str() {
            SCOPE_YES => true,
            SCOPE_NO => false,
            _ => return Err(LegacyFieldsError::ScopeFlag(scope)),
        };
        Ok(Self {
            artist_name,
            track_name,
            notes,
            playlist_title,
            scoped_to_playlist,
        })
    }
}

impl From<DrillRecord> for Vec<String> {
    fn from(rec: DrillRecord) -> Self {
        Vec::from(rec.to_legacy_fields())
    }
}

/// Input to [`crate::core::store::DrillStore::create_or_update_drill`].
///
/// An empty `notes` string requests deletion of the drill at the draft's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDraft {
    /// Playlist the note is being edited under.
    pub playlist_title: String,
    /// Artist of the track.
    pub artist_name: String,
    /// Title of the track.
    pub track_name: String,
    /// Note text.
    pub notes: String,
    /// Limit the note to `playlist_title`.
    pub scoped_to_playlist: bool,
}

impl DrillDraft {
    /// Draft for a note that follows the track into every playlist.
    pub fn general(
        playlist_title: impl Into<String>,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            playlist_title: playlist_title.into(),
            artist_name: artist_name.into(),
            track_name: track_name.into(),
            notes: notes.into(),
            scoped_to_playlist: false,
        }
    }

    /// Draft for a note limited to `playlist_title`.
    pub fn scoped(
        playlist_title: impl Into<String>,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            scoped_to_playlist: true,
            ..Self::general(playlist_title, artist_name, track_name, notes)
        }
    }

    /// Record this draft stores when its notes are not empty.
    pub fn into_record(self) -> DrillRecord {
        DrillRecord {
            artist_name: self.artist_name,
            track_name: self.track_name,
            notes: self.notes,
            playlist_title: self.playlist_title,
            scoped_to_playlist: self.scoped_to_playlist,
        }
    }
}
