//! Persistence seam for the drill table.

pub mod file;
pub mod plist;

use std::path::Path;

use crate::{core::table::DrillTable, drill::LegacyFieldsError};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed drill table: {0}")]
    Malformed(String),
}

impl From<LegacyFieldsError> for PersistError {
    fn from(value: LegacyFieldsError) -> Self {
        Self::Malformed(value.to_string())
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Durable home of a [`DrillTable`].
///
/// Every call to [`TableSink::store`] replaces the whole persisted table.
pub trait TableSink: Send {
    /// Where the table lives. Handed out for sharing.
    fn location(&self) -> &Path;
    /// Reads the persisted table, `Ok(None)` when nothing was persisted yet.
    fn load(&self) -> PersistResult<Option<DrillTable>>;
    fn store(&mut self, table: &DrillTable) -> PersistResult<()>;
}
