use std::collections::HashSet;
use zel_core::db::open_db;
use zel_core::{
    keys, DocumentDate, DocumentStore, KvStore, LoadOutcome, MemoryKvStore, SaveRequest,
    SqliteKvStore, StoreError, DEFAULT_DOCUMENT_NAME,
};

fn content(value: &str) -> SaveRequest {
    SaveRequest {
        content: Some(value.to_string()),
        ..SaveRequest::default()
    }
}

#[test]
fn create_delete_sequences_never_duplicate_ids() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();

    let mut created = Vec::new();
    for round in 0..20 {
        created.push(store.create_document(format!("doc {round}"), "").unwrap().id);
        if round % 3 == 0 {
            let victim = created.remove(0);
            store.delete_document(&victim).unwrap();
        }
        let ids: HashSet<_> = store.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), store.documents().len());
    }
}

#[test]
fn create_prepends_and_activates() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();

    let created = store.create_document("Chapter", "<p>x</p>").unwrap();
    assert_eq!(store.documents()[0].id, created.id);
    assert_eq!(store.documents()[1].name, DEFAULT_DOCUMENT_NAME);
    assert_eq!(store.active_id(), Some(created.id.as_str()));
    assert_eq!(store.get_active().unwrap().unwrap().content, "<p>x</p>");
}

#[test]
fn deleting_active_selects_new_first_then_none() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    let seeded = store.documents()[0].id.clone();
    let second = store.create_document("Second", "").unwrap();

    assert!(store.delete_document(&second.id).unwrap());
    assert_eq!(store.get_active().unwrap().unwrap().id, seeded);

    assert!(store.delete_document(&seeded).unwrap());
    assert!(store.get_active().unwrap().is_none());
    assert!(store.active_id().is_none());
}

#[test]
fn deleting_inactive_document_keeps_selection() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    let seeded = store.documents()[0].id.clone();
    let active = store.create_document("Active", "").unwrap();

    store.delete_document(&seeded).unwrap();
    assert_eq!(store.active_id(), Some(active.id.as_str()));
    assert!(!store.delete_document("missing").unwrap());
}

#[test]
fn memo_only_save_never_touches_document_content() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    store.save(content("body")).unwrap();

    store
        .save(SaveRequest {
            memo: Some("x".to_string()),
            ..SaveRequest::default()
        })
        .unwrap();

    assert_eq!(store.memo(), "x");
    assert_eq!(store.get_active().unwrap().unwrap().content, "body");
}

#[test]
fn explicit_empty_content_clears_the_document() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    store.save(content("body")).unwrap();

    store.save(content("")).unwrap();
    assert_eq!(store.get_active().unwrap().unwrap().content, "");
}

#[test]
fn save_without_active_document_drops_content_but_keeps_memo() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    let only = store.documents()[0].id.clone();
    store.delete_document(&only).unwrap();

    store
        .save(SaveRequest {
            content: Some("lost".to_string()),
            memo: Some("kept".to_string()),
            cursor_pos: Some(3),
        })
        .unwrap();

    assert!(store.documents().is_empty());
    assert_eq!(store.memo(), "kept");
}

#[test]
fn get_active_heals_empty_and_dangling_selection() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    let first = store.create_document("Newest", "").unwrap();

    store.set_active("does-not-exist").unwrap();
    assert_eq!(store.active_id(), Some("does-not-exist"));
    assert_eq!(store.get_active().unwrap().unwrap().id, first.id);

    let reloaded = DocumentStore::initialize(&kv).unwrap();
    assert_eq!(reloaded.active_id(), Some(first.id.as_str()));
}

#[test]
fn rename_updates_known_ids_only() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    let id = store.documents()[0].id.clone();

    assert!(store.rename_document(&id, "Renamed").unwrap());
    assert_eq!(store.documents()[0].name, "Renamed");

    let before = kv.get(keys::STATE).unwrap();
    assert!(!store.rename_document("unknown", "Nope").unwrap());
    assert_eq!(kv.get(keys::STATE).unwrap(), before);
}

#[test]
fn backup_round_trip_restores_identical_state() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    store.create_document("Two", "<p>two</p>").unwrap();
    store
        .save(SaveRequest {
            memo: Some("memo".to_string()),
            cursor_pos: Some(2),
            ..SaveRequest::default()
        })
        .unwrap();
    let snapshot = store.data().clone();
    let blob = store.export_backup().unwrap();

    let other_kv = MemoryKvStore::new();
    let mut other = DocumentStore::initialize(&other_kv).unwrap();
    other.import_backup(&blob).unwrap();

    assert_eq!(other.data(), &snapshot);
    let reloaded = DocumentStore::initialize(&other_kv).unwrap();
    assert_eq!(reloaded.data(), &snapshot);
}

#[test]
fn import_replaces_instead_of_merging() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    store.create_document("Local only", "").unwrap();

    store
        .import_backup(r#"{"projects":[{"id":"a","name":"Imported"}],"activeId":"a","memo":""}"#)
        .unwrap();

    assert_eq!(store.documents().len(), 1);
    assert_eq!(store.documents()[0].name, "Imported");
}

#[test]
fn invalid_backups_are_rejected_without_state_change() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    store.create_document("Keep me", "").unwrap();
    let before = store.data().clone();
    let persisted = kv.get(keys::STATE).unwrap();

    for blob in [
        "{ not valid json",
        r#"{"foo":1}"#,
        r#"{"projects":{}}"#,
        r#"{"projects":[{"id":"d"},{"id":"d"}]}"#,
    ] {
        let err = store.import_backup(blob).unwrap_err();
        assert!(matches!(err, StoreError::InvalidBackup(_)), "{blob}");
        assert_eq!(store.data(), &before);
        assert_eq!(kv.get(keys::STATE).unwrap(), persisted);
    }
}

#[test]
fn hard_reset_then_initialize_yields_seeded_state() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    store.create_document("Gone", "text").unwrap();
    kv.set(keys::THEME, "journal").unwrap();
    kv.set(keys::AUTH_SECRET, "abc").unwrap();

    store.hard_reset().unwrap();
    assert!(kv.is_empty());
    // In-memory state is untouched until the caller reloads.
    assert_eq!(store.documents().len(), 2);

    let fresh = DocumentStore::initialize(&kv).unwrap();
    assert_eq!(fresh.load_outcome(), LoadOutcome::Seeded);
    assert_eq!(fresh.documents().len(), 1);
    assert_eq!(fresh.documents()[0].name, DEFAULT_DOCUMENT_NAME);
    assert_eq!(fresh.active_id(), Some(fresh.documents()[0].id.as_str()));
}

#[test]
fn valid_empty_state_is_restored_without_seeding() {
    let kv = MemoryKvStore::new();
    kv.set(keys::STATE, r#"{"projects":[],"activeId":"stale","memo":"m"}"#)
        .unwrap();

    let mut store = DocumentStore::initialize(&kv).unwrap();
    assert_eq!(store.load_outcome(), LoadOutcome::Restored);
    assert!(store.active_id().is_none());
    assert!(store.get_active().unwrap().is_none());
    assert_eq!(store.memo(), "m");
}

#[test]
fn draft_scenario_survives_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zel.db");

    {
        let conn = open_db(&path).unwrap();
        let mut store = DocumentStore::initialize(SqliteKvStore::new(&conn)).unwrap();
        store.create_document("Draft", "").unwrap();
        store.save(content("Hello")).unwrap();
        store
            .save(SaveRequest {
                cursor_pos: Some(5),
                ..SaveRequest::default()
            })
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let mut store = DocumentStore::initialize(SqliteKvStore::new(&conn)).unwrap();
    let active = store.get_active().unwrap().unwrap();
    assert_eq!(active.name, "Draft");
    assert_eq!(active.content, "Hello");
    assert_eq!(active.cursor_pos, 5);
}

#[test]
fn text_file_import_and_plain_text_export() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();

    let doc = store
        .import_text_file("notes.txt", "<p>Hello&nbsp;world</p><p>Bye</p>")
        .unwrap();
    assert_eq!(doc.name, "notes.txt");
    assert_eq!(store.active_id(), Some(doc.id.as_str()));
    assert_eq!(
        store.export_plain_text().unwrap().as_deref(),
        Some("Hello world\nBye")
    );
}

#[test]
fn share_link_carries_document_text() {
    let kv = MemoryKvStore::new();
    let store = DocumentStore::initialize(&kv).unwrap();

    let link = store
        .generate_share_link("https://zel.local/index.html", "Era uma vez")
        .unwrap();
    let payload = zel_core::share_payload_from_link(&link).unwrap();
    assert_eq!(zel_core::decode_share_payload(payload).unwrap(), "Era uma vez");
}

#[test]
fn locale_dated_backup_survives_import_and_export() {
    let kv = MemoryKvStore::new();
    let mut store = DocumentStore::initialize(&kv).unwrap();
    let blob = r#"{"projects":[{"id":"1700000000000","name":"Antigo","content":"<p>x</p>","date":"18/10/2026, 10:00:00","cursorPos":3}],"activeId":"1700000000000","memo":""}"#;

    store.import_backup(blob).unwrap();
    assert_eq!(
        store.documents()[0].date,
        DocumentDate::Legacy("18/10/2026, 10:00:00".to_string())
    );

    let exported: serde_json::Value =
        serde_json::from_str(&store.export_backup().unwrap()).unwrap();
    let original: serde_json::Value = serde_json::from_str(blob).unwrap();
    assert_eq!(exported, original);

    let reloaded = DocumentStore::initialize(&kv).unwrap();
    assert_eq!(reloaded.data(), store.data());

    let mut store = reloaded;
    store.save(content("<p>y</p>")).unwrap();
    assert!(store.documents()[0].date.as_millis().is_some());
}
