//! Practice-drill notes keyed by track, with write-through property-list
//! persistence and merge-on-import sharing.
//!
//! # Examples
//!
//! Synchronous usage with [`core::store::DrillStore`]:
//! ```no_run
//! use drillbook::{config::StoreConfig, core::store::DrillStore, drill::DrillDraft};
//!
//! let config = StoreConfig::in_dir("drills");
//! let mut store = DrillStore::open_with_config(&config).expect("open");
//! store
//!     .create_or_update_drill(DrillDraft::scoped("Intervals", "Queen", "Bicycle Race", "Sprint 30s"))
//!     .expect("save");
//! assert_eq!(store.lookup_drill("Intervals", "Queen", "Bicycle Race"), Some("Sprint 30s"));
//! assert_eq!(store.lookup_drill("OtherList", "Queen", "Bicycle Race"), None);
//! ```
//!
//! Runtime usage when several tasks share the store:
//! ```no_run
//! use drillbook::{
//!     config::StoreConfig,
//!     core::store::DrillStore,
//!     drill::DrillDraft,
//!     runtime::handle::{spawn_drillbook, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = DrillStore::open_with_config(&StoreConfig::in_dir("drills")).expect("open");
//! let handle = spawn_drillbook(store, RuntimeConfig::default());
//! handle
//!     .create_or_update_drill(DrillDraft::general("Intervals", "Queen", "Bicycle Race", "Recover"))
//!     .await
//!     .expect("save");
//! let notes = handle.lookup_drill("OtherList", "Queen", "Bicycle Race").await.expect("lookup");
//! assert_eq!(notes.as_deref(), Some("Recover"));
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Storage location configuration.
pub mod config;
/// Drill table and write-through store.
pub mod core;
/// Drill record and draft types.
pub mod drill;
/// Key derivation from track identity.
pub mod key;
/// Persistence abstraction and property-list file sink.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Selection-based drill lookups for the player screens.
pub mod session;
/// Shared aliases and constants.
pub mod types;
