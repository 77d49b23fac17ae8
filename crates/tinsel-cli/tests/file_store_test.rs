//! File store integration tests with Oracle checks
//!
//! These tests verify the history store's invariants on a real directory:
//! - Save then load returns the same snapshot
//! - `list` is sorted and only reports snapshots
//! - Delete is idempotent
//! - A finished draw lands in the store exactly once

use std::fs;

use chrono::{DateTime, Utc};
use tinsel_cli::{DrawOptions, FileStore, OutputFormat, RosterFile, SeededEnv, commands};
use tinsel_core::{
    ExchangeId, ExchangeSnapshot, ExchangeStore, InterchangeDocument, Participant, StoreError,
};

fn snapshot(id: u64, event: &str) -> ExchangeSnapshot {
    ExchangeSnapshot {
        id: ExchangeId(id),
        event: event.to_string(),
        created_at: DateTime::<Utc>::default(),
        completed: false,
        participants: vec![Participant::new("a", "Ann"), Participant::new("b", "Bob")],
        document: InterchangeDocument {
            event: event.to_string(),
            generated_at: None,
            assignments: Vec::new(),
        },
    }
}

// Oracle: every listed id loads, and the list is strictly ascending
fn verify_store_invariants(store: &impl ExchangeStore, expected: &[u64]) {
    let ids = store.list().expect("list failed");
    assert_eq!(ids, expected.iter().copied().map(ExchangeId).collect::<Vec<_>>());

    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "list not ascending: {pair:?}");
    }
    for id in ids {
        let loaded = store.load(id).expect("load failed").expect("listed id missing");
        assert_eq!(loaded.id, id);
    }
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    let original = snapshot(0xabc, "Office");
    store.save(&original).unwrap();

    assert_eq!(store.load(ExchangeId(0xabc)).unwrap(), Some(original));
    assert_eq!(store.load(ExchangeId(0xdef)).unwrap(), None);
    assert!(dir.path().join("0000000000000abc.cbor").exists());
    verify_store_invariants(&store, &[0xabc]);
}

#[test]
fn test_save_replaces_existing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    store.save(&snapshot(1, "First")).unwrap();
    store.save(&snapshot(1, "Second")).unwrap();

    assert_eq!(store.load(ExchangeId(1)).unwrap().unwrap().event, "Second");
    verify_store_invariants(&store, &[1]);
}

#[test]
fn test_list_sorted_and_ignores_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    for id in [30, 10, 20] {
        store.save(&snapshot(id, "Party")).unwrap();
    }
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    fs::write(dir.path().join("not-an-id.cbor"), "junk").unwrap();

    verify_store_invariants(&store, &[10, 20, 30]);
}

#[test]
fn test_delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    store.save(&snapshot(5, "Party")).unwrap();
    assert!(store.delete(ExchangeId(5)).unwrap());
    assert!(!store.delete(ExchangeId(5)).unwrap());
    verify_store_invariants(&store, &[]);
}

#[test]
fn test_corrupt_snapshot_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    fs::write(dir.path().join(format!("{}.cbor", ExchangeId(9))), [0xff, 0xff]).unwrap();
    assert!(matches!(store.load(ExchangeId(9)), Err(StoreError::Decode(_))));
}

#[test]
fn test_open_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");

    let store = FileStore::open(&nested).unwrap();
    assert_eq!(store.dir(), nested.as_path());
    assert!(nested.is_dir());
}

#[test]
fn test_draw_persists_to_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let roster = RosterFile::parse(
        r#"
        event = "Office"

        [[participants]]
        id = "a"
        name = "Ann"

        [[participants]]
        id = "b"
        name = "Bob"

        [[participants]]
        id = "c"
        name = "Cat"
        "#,
    )
    .unwrap();

    let options = DrawOptions { format: OutputFormat::Json, ..DrawOptions::default() };
    let json = commands::draw(&roster, &options, SeededEnv::new(21), &store).unwrap();

    let ids = store.list().unwrap();
    assert_eq!(ids.len(), 1);

    let saved = store.load(ids[0]).unwrap().unwrap();
    assert!(saved.completed);
    assert_eq!(saved.participants.len(), 3);

    // The printed export and the stored one describe the same draw
    let printed = InterchangeDocument::from_json(&json).unwrap();
    assert_eq!(printed.assignments, saved.document.assignments);

    let listing = commands::history_list(&store).unwrap();
    assert!(listing.contains("Office  3 picks"));
}

#[test]
fn test_history_list_survives_corrupt_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    store.save(&snapshot(2, "Office")).unwrap();
    fs::write(dir.path().join(format!("{}.cbor", ExchangeId(1))), [0xff]).unwrap();

    let listing = commands::history_list(&store).unwrap();
    let lines: Vec<_> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], format!("{}  (unreadable)", ExchangeId(1)));
    assert!(lines[1].starts_with(&ExchangeId(2).to_string()));
    assert!(lines[1].contains("Office  0 picks (incomplete)"));
}
