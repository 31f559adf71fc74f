//! Property-list file sink for the canonical drill table.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{config::StoreConfig, core::table::DrillTable};

use super::{
    PersistResult, TableSink,
    plist::{decode_table, encode_table},
};

/// [`TableSink`] keeping the table in one XML property-list file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so readers never see a partially written document.
#[derive(Debug, Clone)]
pub struct PlistFileSink {
    path: PathBuf,
}

impl PlistFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.location.clone())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TableSink for PlistFileSink {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PersistResult<Option<DrillTable>> {
        match fs::read(&self.path) {
            Ok(bytes) => decode_table(&bytes).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&mut self, table: &DrillTable) -> PersistResult<()> {
        let bytes = encode_table(table)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes)?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        log::debug!(
            "Stored {} drill(s) into {}",
            table.len(),
            self.path.display()
        );
        Ok(())
    }
}
