use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tempfile::TempDir;

use drillbook::{
    core::{
        store::{DrillStore, DrillUpdate, StoreError},
        table::DrillTable,
    },
    drill::DrillDraft,
    persist::{PersistError, PersistResult, TableSink, plist::encode_table},
};

#[derive(Default)]
struct Recorded {
    stored: Option<DrillTable>,
    writes: usize,
}

struct MemorySink {
    path: PathBuf,
    state: Arc<Mutex<Recorded>>,
    fail_writes: bool,
}

impl MemorySink {
    fn new(state: Arc<Mutex<Recorded>>) -> Self {
        Self {
            path: PathBuf::from("memory/CycleMusicTimerDrills.cmt"),
            state,
            fail_writes: false,
        }
    }
}

impl TableSink for MemorySink {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PersistResult<Option<DrillTable>> {
        Ok(self.state.lock().expect("lock").stored.clone())
    }

    fn store(&mut self, table: &DrillTable) -> PersistResult<()> {
        if self.fail_writes {
            return Err(PersistError::Io(std::io::Error::other("disk full")));
        }
        let mut state = self.state.lock().expect("lock");
        state.stored = Some(table.clone());
        state.writes += 1;
        Ok(())
    }
}

fn memory_store() -> (DrillStore, Arc<Mutex<Recorded>>) {
    let state = Arc::new(Mutex::new(Recorded::default()));
    let store = DrillStore::open(Box::new(MemorySink::new(Arc::clone(&state)))).expect("open");
    (store, state)
}

#[test]
fn scoped_then_general_scenario() {
    let (mut store, _) = memory_store();

    store
        .create_or_update_drill(DrillDraft::scoped("Intervals", "Queen", "Bicycle Race", "Sprint 30s"))
        .expect("scoped");
    assert_eq!(store.lookup_drill("Intervals", "Queen", "Bicycle Race"), Some("Sprint 30s"));
    assert_eq!(store.lookup_drill("OtherList", "Queen", "Bicycle Race"), None);

    store
        .create_or_update_drill(DrillDraft::general("Intervals", "Queen", "Bicycle Race", "Recover"))
        .expect("general");
    assert!(!store.is_scoped_to_playlist("Intervals", "Queen", "Bicycle Race"));
    assert_eq!(store.lookup_drill("OtherList", "Queen", "Bicycle Race"), Some("Recover"));
    assert_eq!(store.lookup_drill("Intervals", "Queen", "Bicycle Race"), Some("Recover"));
    assert_eq!(store.len(), 1);
}

#[test]
fn scoped_drill_shadows_general_drill() {
    let (mut store, _) = memory_store();

    store
        .create_or_update_drill(DrillDraft::general("Mix", "Queen", "Bicycle Race", "general"))
        .expect("general");
    store
        .create_or_update_drill(DrillDraft::scoped("Intervals", "Queen", "Bicycle Race", "scoped"))
        .expect("scoped");

    assert_eq!(store.lookup_drill("Intervals", "Queen", "Bicycle Race"), Some("scoped"));
    assert_eq!(store.lookup_drill("Mix", "Queen", "Bicycle Race"), Some("general"));
    assert!(store.is_scoped_to_playlist("Intervals", "Queen", "Bicycle Race"));
    assert!(!store.is_scoped_to_playlist("Mix", "Queen", "Bicycle Race"));
}

#[test]
fn general_record_keeps_playlist_title() {
    let (mut store, _) = memory_store();
    store
        .create_or_update_drill(DrillDraft::general("Mix", "Queen", "Bicycle Race", "n"))
        .expect("general");

    let rec = store.get("Queen|+|Bicycle Race").expect("record");
    assert_eq!(rec.playlist_title, "Mix");
    assert!(!rec.scoped_to_playlist);
}

#[test]
fn empty_notes_delete_at_the_draft_key() {
    let (mut store, _) = memory_store();
    store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T", "general"))
        .expect("general");
    store
        .create_or_update_drill(DrillDraft::scoped("Intervals", "A", "T", "scoped"))
        .expect("scoped");

    store
        .create_or_update_drill(DrillDraft::scoped("Intervals", "A", "T", ""))
        .expect("delete scoped");
    assert!(!store.is_scoped_to_playlist("Intervals", "A", "T"));
    assert_eq!(store.lookup_drill("Intervals", "A", "T"), Some("general"));

    store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T", ""))
        .expect("delete general");
    assert_eq!(store.lookup_drill("Intervals", "A", "T"), None);
    assert!(store.is_empty());

    // Deleting what is not there is fine.
    store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T", ""))
        .expect("delete again");
}

#[test]
fn general_draft_only_demotes_its_own_playlist() {
    let (mut store, _) = memory_store();
    store
        .create_or_update_drill(DrillDraft::scoped("Intervals", "A", "T", "intervals"))
        .expect("scoped a");
    store
        .create_or_update_drill(DrillDraft::scoped("Climbs", "A", "T", "climbs"))
        .expect("scoped b");

    store
        .create_or_update_drill(DrillDraft::general("Intervals", "A", "T", "general"))
        .expect("general");

    assert!(!store.is_scoped_to_playlist("Intervals", "A", "T"));
    assert!(store.is_scoped_to_playlist("Climbs", "A", "T"));
    assert_eq!(store.lookup_drill("Climbs", "A", "T"), Some("climbs"));
}

#[test]
fn remove_scoped_drill_leaves_general_drill() {
    let (mut store, state) = memory_store();
    store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T", "general"))
        .expect("general");
    store
        .create_or_update_drill(DrillDraft::scoped("Intervals", "A", "T", "scoped"))
        .expect("scoped");

    store.remove_scoped_drill("A", "T", "Intervals").expect("remove");
    assert_eq!(store.lookup_drill("Intervals", "A", "T"), Some("general"));

    let before = state.lock().expect("lock").writes;
    store.remove_scoped_drill("A", "T", "Intervals").expect("remove missing");
    assert_eq!(state.lock().expect("lock").writes, before + 1);
}

#[test]
fn every_mutation_writes_the_full_table() {
    let (mut store, state) = memory_store();
    store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T1", "one"))
        .expect("one");
    store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T2", "two"))
        .expect("two");

    let state = state.lock().expect("lock");
    assert_eq!(state.writes, 2);
    assert_eq!(state.stored.as_ref(), Some(store.table()));
}

#[test]
fn invalid_drafts_are_rejected_without_changes() {
    let (mut store, state) = memory_store();

    let err = store
        .create_or_update_drill(DrillDraft::general("Mix", "", "T", "n"))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDraft(_)));

    let err = store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "", "n"))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDraft(_)));

    let err = store
        .create_or_update_drill(DrillDraft::scoped("", "A", "T", "n"))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDraft(_)));

    // A general drill may be saved outside any playlist.
    store
        .create_or_update_drill(DrillDraft::general("", "A", "T", "n"))
        .expect("general without playlist");

    assert_eq!(store.len(), 1);
    assert_eq!(state.lock().expect("lock").writes, 1);
}

#[test]
fn failed_write_is_reported_and_change_is_kept() {
    let state = Arc::new(Mutex::new(Recorded::default()));
    let mut sink = MemorySink::new(Arc::clone(&state));
    sink.fail_writes = true;
    let mut store = DrillStore::open(Box::new(sink)).expect("open without stored table");

    let err = store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T", "kept"))
        .unwrap_err();
    match err {
        StoreError::Persist { path, source } => {
            assert_eq!(path, PathBuf::from("memory/CycleMusicTimerDrills.cmt"));
            assert!(matches!(source, PersistError::Io(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.lookup_drill("Mix", "A", "T"), Some("kept"));
    assert_eq!(state.lock().expect("lock").writes, 0);
}

#[test]
fn export_location_is_the_sink_location() {
    let (store, _) = memory_store();
    assert_eq!(
        store.export_location(),
        Path::new("memory/CycleMusicTimerDrills.cmt")
    );
}

#[test]
fn failed_resave_after_load_fails_open() {
    let stored: DrillTable = [DrillDraft::general("Mix", "A", "T", "stored").into_record()]
        .into_iter()
        .collect();
    let state = Arc::new(Mutex::new(Recorded {
        stored: Some(stored),
        writes: 0,
    }));
    let mut sink = MemorySink::new(Arc::clone(&state));
    sink.fail_writes = true;

    match DrillStore::open(Box::new(sink)) {
        Err(StoreError::Persist { source, .. }) => assert!(matches!(source, PersistError::Io(_))),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("open should fail when the loaded table cannot be written back"),
    }
}

#[test]
fn failed_import_write_is_reported_and_merge_is_kept() {
    let tmp = TempDir::new().expect("tmp");
    let external = tmp.path().join("shared.cmt");
    let incoming: DrillTable = [DrillDraft::scoped("Theirs", "B", "T", "shared").into_record()]
        .into_iter()
        .collect();
    fs::write(&external, encode_table(&incoming).expect("encode")).expect("seed");

    let state = Arc::new(Mutex::new(Recorded::default()));
    let mut sink = MemorySink::new(Arc::clone(&state));
    sink.fail_writes = true;
    let mut store = DrillStore::open(Box::new(sink)).expect("open");

    let err = store.import_and_merge(&external).unwrap_err();
    assert!(matches!(err, StoreError::Persist { .. }));
    assert_eq!(store.lookup_drill("Theirs", "B", "T"), Some("shared"));
    assert_eq!(state.lock().expect("lock").writes, 0);
}

#[test]
fn control_characters_are_rejected() {
    let (mut store, state) = memory_store();

    for notes in ["x\u{1}y", "bell\u{7}", "\u{1b}[0m"] {
        let err = store
            .create_or_update_drill(DrillDraft::general("Mix", "A", "T", notes))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidDraft(_)));
    }
    let err = store
        .create_or_update_drill(DrillDraft::scoped("Mix\u{0}", "A", "T", "n"))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDraft(_)));
    assert!(store.is_empty());
    assert_eq!(state.lock().expect("lock").writes, 0);

    store
        .create_or_update_drill(DrillDraft::general("Mix", "A", "T", "tab\there\r\nnext"))
        .expect("tab and line breaks are fine");
    assert_eq!(store.lookup_drill("Mix", "A", "T"), Some("tab\there\r\nnext"));
}

#[test]
fn general_draft_reports_replaced_scoped_drill() {
    let (mut store, _) = memory_store();
    let first = store
        .create_or_update_drill(DrillDraft::general("Intervals", "A", "T", "general"))
        .expect("general");
    assert_eq!(
        first,
        DrillUpdate {
            key: "A|+|T".to_string(),
            removed: false,
            demoted: None,
        }
    );

    store
        .create_or_update_drill(DrillDraft::scoped("Intervals", "A", "T", "scoped"))
        .expect("scoped");
    let update = store
        .create_or_update_drill(DrillDraft::general("Intervals", "A", "T", ""))
        .expect("demote and delete");
    assert_eq!(
        update,
        DrillUpdate {
            key: "A|+|T".to_string(),
            removed: true,
            demoted: Some("A|+|T|+|Intervals".to_string()),
        }
    );
    assert!(store.is_empty());
}
