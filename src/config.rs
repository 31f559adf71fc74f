//! Where the canonical drill table lives.

use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};

use crate::types::DRILLS_FILE_NAME;

/// Store configuration, injected into [`crate::core::store::DrillStore::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Canonical path of the drill table file.
    pub location: PathBuf,
}

impl StoreConfig {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Table file named [`DRILLS_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DRILLS_FILE_NAME))
    }

    /// Table file in the user's documents directory, or in the application
    /// data directory on platforms without one.
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn for_installation() -> Option<Self> {
        if let Some(dir) = UserDirs::new().as_ref().and_then(UserDirs::document_dir) {
            return Some(Self::in_dir(dir));
        }
        let dirs = ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))?;
        Some(Self::in_dir(dirs.data_dir()))
    }
}
