use std::path::{Path, PathBuf};

use crate::{
    config::StoreConfig,
    core::table::DrillTable,
    drill::{DrillDraft, DrillRecord},
    key::{general_key, scoped_key},
    persist::{PersistError, TableSink, file::PlistFileSink, plist::read_table_file},
    types::DrillKey,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid drill: {0}")]
    InvalidDraft(&'static str),
    #[error("failed to persist drills to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
}

/// What [`DrillStore::create_or_update_drill`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillUpdate {
    /// Key the draft was written to, or deleted at for empty notes.
    pub key: DrillKey,
    /// True when the draft's empty notes deleted the drill at `key`.
    pub removed: bool,
    /// Playlist-only drill deleted because a general draft replaced it.
    pub demoted: Option<DrillKey>,
}

/// Result of [`DrillStore::import_and_merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The external table was merged and the result persisted.
    Merged {
        /// Number of entries taken from the external table.
        entries: usize,
    },
    /// The external table could not be read or decoded; nothing changed.
    Ignored,
}

/// Single source of truth for drills, written through to its sink on every
/// mutation.
///
/// A failed write leaves the requested change applied in memory and is
/// reported as [`StoreError::Persist`].
pub struct DrillStore {
    table: DrillTable,
    sink: Box<dyn TableSink>,
}

impl DrillStore {
    /// Opens the store and loads the persisted table, see
    /// [`DrillStore::load_from_storage`].
    pub fn open(sink: Box<dyn TableSink>) -> Result<Self, StoreError> {
        let mut store = Self {
            table: DrillTable::new(),
            sink,
        };
        store.load_from_storage()?;
        Ok(store)
    }

    pub fn open_with_config(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open(Box::new(PlistFileSink::from_config(config)))
    }

    /// Replaces the in-memory table with the persisted one.
    ///
    /// A missing or undecodable file yields an empty table and is not an
    /// error; the file is left as it is. A successfully read table is written
    /// back at once to normalize its layout. Returns the number of drills.
    pub fn load_from_storage(&mut self) -> Result<usize, StoreError> {
        match self.sink.load() {
            Ok(Some(table)) => {
                log::debug!(
                    "Loaded {} drill(s) from {}",
                    table.len(),
                    self.sink.location().display()
                );
                self.table = table;
                self.persist()?;
            }
            Ok(None) => {
                log::debug!(
                    "No drills stored at {} yet",
                    self.sink.location().display()
                );
                self.table = DrillTable::new();
            }
            Err(err) => {
                log::warn!(
                    "Failed to read drills from {}: {}",
                    self.sink.location().display(),
                    err
                );
                self.table = DrillTable::new();
            }
        }
        Ok(self.table.len())
    }

    /// Creates, replaces, or deletes the drill described by `draft`.
    ///
    /// A general draft first removes the scoped drill for the same artist,
    /// track and playlist, so the new general note is not shadowed there.
    /// Empty notes delete the drill at the draft's key.
    pub fn create_or_update_drill(&mut self, draft: DrillDraft) -> Result<DrillUpdate, StoreError> {
        validate(&draft)?;

        let mut demoted = None;
        let key = if draft.scoped_to_playlist {
            scoped_key(&draft.artist_name, &draft.track_name, &draft.playlist_title)
        } else {
            let scoped = scoped_key(&draft.artist_name, &draft.track_name, &draft.playlist_title);
            if self.table.remove(&scoped).is_some() {
                demoted = Some(scoped);
            }
            general_key(&draft.artist_name, &draft.track_name)
        };

        let removed = draft.notes.is_empty();
        if removed {
            self.table.remove(&key);
        } else {
            self.table.insert(key.clone(), draft.into_record());
        }

        self.persist()?;
        Ok(DrillUpdate {
            key,
            removed,
            demoted,
        })
    }

    /// Notes for a track: the playlist-scoped drill if there is one, else the
    /// general drill.
    pub fn lookup_drill(&self, playlist_title: &str, artist_name: &str, track_name: &str) -> Option<&str> {
        self.table
            .get(&scoped_key(artist_name, track_name, playlist_title))
            .or_else(|| self.table.get(&general_key(artist_name, track_name)))
            .map(|rec| rec.notes.as_str())
    }

    pub fn is_scoped_to_playlist(&self, playlist_title: &str, artist_name: &str, track_name: &str) -> bool {
        self.table
            .contains_key(&scoped_key(artist_name, track_name, playlist_title))
    }

    /// Removes the playlist-scoped drill, if any, and persists.
    pub fn remove_scoped_drill(&mut self, artist_name: &str, track_name: &str, playlist_title: &str) -> Result<(), StoreError> {
        self.table
            .remove(&scoped_key(artist_name, track_name, playlist_title));
        self.persist()
    }

    /// Merges the table stored at `location` into this one. Entries from
    /// `location` replace existing entries with the same key.
    ///
    /// An unreadable or undecodable source is ignored without touching the
    /// current table. Only a failing write of the merged table is an error.
    pub fn import_and_merge(&mut self, location: impl AsRef<Path>) -> Result<ImportOutcome, StoreError> {
        let location = location.as_ref();
        let incoming = match read_table_file(location) {
            Ok(table) => table,
            Err(err) => {
                log::warn!("Ignoring drills from {}: {}", location.display(), err);
                return Ok(ImportOutcome::Ignored);
            }
        };

        let entries = self.table.merge_from(incoming);
        log::info!("Merged {} drill(s) from {}", entries, location.display());
        self.persist()?;
        Ok(ImportOutcome::Merged { entries })
    }

    /// Canonical storage location, for handing to a share mechanism.
    ///
    /// This is the live file, not a copy.
    pub fn export_location(&self) -> &Path {
        self.sink.location()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DrillRecord> {
        self.table.get(key)
    }

    pub fn table(&self) -> &DrillTable {
        &self.table
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.sink.store(&self.table).map_err(|source| {
            let path = self.sink.location().to_path_buf();
            log::error!("Failed to persist drills to {}: {}", path.display(), source);
            StoreError::Persist { path, source }
        })
    }
}

fn validate(draft: &DrillDraft) -> Result<(), StoreError> {
    if draft.artist_name.is_empty() {
        return Err(StoreError::InvalidDraft("artist name is empty"));
    }
    if draft.track_name.is_empty() {
        return Err(StoreError::InvalidDraft("track name is empty"));
    }
    if draft.scoped_to_playlist && draft.playlist_title.is_empty() {
        return Err(StoreError::InvalidDraft(
            "playlist-only drill without a playlist title",
        ));
    }
    let fields = [
        &draft.artist_name,
        &draft.track_name,
        &draft.notes,
        &draft.playlist_title,
    ];
    if fields.iter().any(|field| field.chars().any(is_forbidden_xml_char)) {
        return Err(StoreError::InvalidDraft(
            "control characters cannot be stored",
        ));
    }
    Ok(())
}

/// Characters XML 1.0 cannot carry, even as character references.
fn is_forbidden_xml_char(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}
