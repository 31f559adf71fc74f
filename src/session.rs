//! Drill lookups phrased in terms of the player's current selection.
//!
//! The timer screens never deal in keys. They ask for "the drill of the
//! selected track", "the drill coming up next", or "the first line of the
//! drill for row N". [`DrillSession`] answers those against a
//! [`TrackCursor`], the media-library side of the app.

use std::path::Path;

use crate::{
    core::store::{DrillStore, DrillUpdate, StoreError},
    drill::DrillDraft,
};

/// Line placed above the next track's drill by [`DrillSession::next_drill`].
pub const NEXT_DRILL_HEADER: &str = "\n______ Next Drill ______\n";

/// Identity of the tracks in the playlist being played.
pub trait TrackCursor {
    /// Title of the selected playlist, `None` when no playlist is selected.
    fn playlist_title(&self) -> Option<String>;
    /// Index of the selected track within the playlist.
    fn selected_track_index(&self) -> Option<usize>;
    /// Number of tracks in the selected playlist.
    fn track_count(&self) -> usize;
    fn artist_name(&self, track_index: usize) -> String;
    fn track_name(&self, track_index: usize) -> String;
}

struct Selection {
    playlist_title: String,
    artist_name: String,
    track_name: String,
}

pub struct DrillSession<'a, C> {
    store: &'a mut DrillStore,
    cursor: &'a C,
}

impl<'a, C: TrackCursor> DrillSession<'a, C> {
    pub fn new(store: &'a mut DrillStore, cursor: &'a C) -> Self {
        Self { store, cursor }
    }

    /// Drill for the selected track, empty if none.
    pub fn current_drill(&self) -> String {
        let Some(index) = self.cursor.selected_track_index() else {
            return String::new();
        };
        self.drill_at(index).unwrap_or_default()
    }

    /// Drill for the track after the selected one, prefixed with
    /// [`NEXT_DRILL_HEADER`]. Empty at the end of the playlist or when the
    /// next track has no drill.
    pub fn next_drill(&self) -> String {
        let Some(index) = self.cursor.selected_track_index() else {
            return String::new();
        };
        let Some(next) = index.checked_add(1) else {
            return String::new();
        };
        match self.drill_at(next) {
            Some(notes) => format!("{NEXT_DRILL_HEADER}{notes}"),
            None => String::new(),
        }
    }

    /// First line of the drill for `track_index`, empty if none.
    pub fn first_line(&self, track_index: usize) -> String {
        self.drill_at(track_index)
            .and_then(|notes| notes.split('\n').next().map(str::to_owned))
            .unwrap_or_default()
    }

    /// True when the selected track's drill only applies to this playlist.
    pub fn drill_is_for_playlist(&self) -> bool {
        let Some(sel) = self.selection() else {
            return false;
        };
        self.store
            .is_scoped_to_playlist(&sel.playlist_title, &sel.artist_name, &sel.track_name)
    }

    /// Stores `notes` for the selected track; empty notes delete its drill.
    pub fn save_current_drill(
        &mut self,
        notes: impl Into<String>,
        this_playlist_only: bool,
    ) -> Result<DrillUpdate, StoreError> {
        let sel = self
            .selection()
            .ok_or(StoreError::InvalidDraft("no track selected"))?;
        self.store.create_or_update_drill(DrillDraft {
            playlist_title: sel.playlist_title,
            artist_name: sel.artist_name,
            track_name: sel.track_name,
            notes: notes.into(),
            scoped_to_playlist: this_playlist_only,
        })
    }

    /// Location to hand to a share sheet.
    pub fn share_location(&self) -> &Path {
        self.store.export_location()
    }

    fn selection(&self) -> Option<Selection> {
        let index = self.cursor.selected_track_index()?;
        self.selection_at(index)
    }

    fn selection_at(&self, index: usize) -> Option<Selection> {
        if index >= self.cursor.track_count() {
            return None;
        }
        Some(Selection {
            playlist_title: self.cursor.playlist_title()?,
            artist_name: self.cursor.artist_name(index),
            track_name: self.cursor.track_name(index),
        })
    }

    fn drill_at(&self, index: usize) -> Option<String> {
        let sel = self.selection_at(index)?;
        self.store
            .lookup_drill(&sel.playlist_title, &sel.artist_name, &sel.track_name)
            .map(str::to_owned)
    }
}
