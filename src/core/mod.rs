//! In-memory drill table and the write-through store.

/// Authoritative drill store.
pub mod store;
/// Key-to-record table and merge helper.
pub mod table;
