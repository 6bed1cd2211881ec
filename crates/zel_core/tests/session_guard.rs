use zel_core::db::open_db_in_memory;
use zel_core::{
    keys, DocumentStore, GuardError, GuardState, KvStore, MemoryKvStore, SessionGuard,
    SqliteKvStore,
};

fn configured<'a>(kv: &'a MemoryKvStore, secret: &str) -> SessionGuard<&'a MemoryKvStore> {
    let mut guard = SessionGuard::new(kv);
    assert_eq!(guard.start().unwrap(), GuardState::Setup);
    guard.setup(secret, secret).unwrap();
    guard
}

#[test]
fn new_guard_is_unconfigured_until_started() {
    let kv = MemoryKvStore::new();
    let guard = SessionGuard::new(&kv);
    assert_eq!(guard.state(), GuardState::Unconfigured);
    assert!(!guard.is_configured().unwrap());
}

#[test]
fn setup_stores_secret_and_unlocks() {
    let kv = MemoryKvStore::new();
    let guard = configured(&kv, "abc");

    assert_eq!(guard.state(), GuardState::Unlocked);
    assert_eq!(kv.get(keys::AUTH_SECRET).unwrap().as_deref(), Some("abc"));
    assert_eq!(kv.get(keys::LOCKED).unwrap().as_deref(), Some("false"));
}

#[test]
fn unlock_accepts_exact_secret_and_rejects_others() {
    let kv = MemoryKvStore::new();
    let mut guard = configured(&kv, "abc");
    guard.lock().unwrap();

    for attempt in ["wrong", "ABC", "abc ", ""] {
        let err = guard.unlock(attempt).unwrap_err();
        assert!(matches!(err, GuardError::Rejected));
        assert_eq!(guard.state(), GuardState::Locked);
        assert_eq!(kv.get(keys::LOCKED).unwrap().as_deref(), Some("true"));
    }

    assert_eq!(guard.unlock("abc").unwrap(), GuardState::Unlocked);
    assert_eq!(kv.get(keys::LOCKED).unwrap().as_deref(), Some("false"));
}

#[test]
fn reload_after_explicit_lock_stays_locked() {
    let kv = MemoryKvStore::new();
    let mut guard = configured(&kv, "abc");
    guard.lock().unwrap();
    drop(guard);

    let mut reloaded = SessionGuard::new(&kv);
    assert_eq!(reloaded.start().unwrap(), GuardState::Locked);
}

#[test]
fn reload_without_explicit_lock_skips_prompt() {
    let kv = MemoryKvStore::new();
    drop(configured(&kv, "abc"));

    let mut reloaded = SessionGuard::new(&kv);
    assert_eq!(reloaded.start().unwrap(), GuardState::Unlocked);

    kv.remove(keys::LOCKED).unwrap();
    let mut without_flag = SessionGuard::new(&kv);
    assert_eq!(without_flag.start().unwrap(), GuardState::Unlocked);
}

#[test]
fn hard_reset_requires_current_secret() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKvStore::new(&conn);
    let mut store = DocumentStore::initialize(kv).unwrap();
    store.create_document("Precious", "text").unwrap();

    let mut guard = SessionGuard::new(kv);
    guard.start().unwrap();
    guard.setup("abc", "abc").unwrap();

    let err = guard.confirm_hard_reset("nope").unwrap_err();
    assert!(matches!(err, GuardError::Rejected));
    assert!(kv.get(keys::STATE).unwrap().is_some());
    assert_eq!(guard.state(), GuardState::Unlocked);

    guard.confirm_hard_reset("abc").unwrap();
    assert_eq!(guard.state(), GuardState::Unconfigured);
    assert!(kv.get(keys::STATE).unwrap().is_none());
    assert!(kv.get(keys::AUTH_SECRET).unwrap().is_none());
    assert_eq!(guard.start().unwrap(), GuardState::Setup);

    let fresh = DocumentStore::initialize(kv).unwrap();
    assert_eq!(fresh.documents().len(), 1);
}

#[test]
fn rejected_hard_reset_writes_nothing() {
    let kv = MemoryKvStore::new();
    kv.set(keys::AUTH_SECRET, "abc").unwrap();
    kv.set(keys::LOCKED, "true").unwrap();
    let mut guard = SessionGuard::new(&kv);

    let err = guard.confirm_hard_reset("bad").unwrap_err();
    assert!(matches!(err, GuardError::Rejected));
    assert!(kv.get(keys::STATE).unwrap().is_none());
    assert_eq!(kv.len(), 2);
    assert_eq!(kv.get(keys::LOCKED).unwrap().as_deref(), Some("true"));
}

#[test]
fn hard_reset_without_secret_is_not_confirmable() {
    let kv = MemoryKvStore::new();
    DocumentStore::initialize(&kv).unwrap();
    let mut guard = SessionGuard::new(&kv);
    guard.start().unwrap();

    let err = guard.confirm_hard_reset("").unwrap_err();
    assert!(matches!(err, GuardError::NotConfigured));
    assert!(kv.get(keys::STATE).unwrap().is_some());
}

#[test]
fn locked_session_blocks_document_commands_until_unlocked() {
    let kv = MemoryKvStore::new();
    let mut guard = configured(&kv, "abc");
    guard.lock().unwrap();
    drop(guard);

    let mut reloaded = SessionGuard::new(&kv);
    assert!(matches!(reloaded.ensure_unlocked(), Err(GuardError::Locked)));
    reloaded.unlock("abc").unwrap();
    reloaded.ensure_unlocked().unwrap();
}
