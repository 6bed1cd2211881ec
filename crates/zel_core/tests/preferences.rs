use zel_core::service::preferences::{messages, FONTS, POMODORO_DURATION_MS, THEMES};
use zel_core::{
    keys, KvStore, Language, MemoryKvStore, PomodoroStatus, PreferenceError, Preferences,
    SqliteKvStore,
};

#[test]
fn language_defaults_to_portuguese_and_persists_choice() {
    let kv = MemoryKvStore::new();
    let prefs = Preferences::new(&kv);
    assert_eq!(prefs.language().unwrap(), Language::Pt);

    prefs.set_language("es").unwrap();
    assert_eq!(prefs.language().unwrap(), Language::Es);
    assert_eq!(messages(Language::Es).wrong_pass, "CONTRASEÑA INCORRECTA");

    let err = prefs.set_language("de").unwrap_err();
    assert!(matches!(err, PreferenceError::UnsupportedLanguage(code) if code == "de"));
    assert_eq!(kv.get(keys::LANGUAGE).unwrap().as_deref(), Some("es"));
}

#[test]
fn theme_cycle_wraps_and_recovers_from_unknown_values() {
    let kv = MemoryKvStore::new();
    let prefs = Preferences::new(&kv);
    assert_eq!(prefs.theme().unwrap(), "tva");

    let mut seen = Vec::new();
    for _ in 0..THEMES.len() {
        seen.push(prefs.cycle_theme().unwrap());
    }
    assert_eq!(seen.last().copied(), Some("tva"));
    assert_eq!(seen[0], "ibm-light");

    kv.set(keys::THEME, "neon").unwrap();
    assert_eq!(prefs.cycle_theme().unwrap(), "tva");
}

#[test]
fn font_cycle_wraps_and_is_frozen_in_journal_theme() {
    let kv = MemoryKvStore::new();
    let prefs = Preferences::new(&kv);
    kv.set(keys::FONT_INDEX, "garbage").unwrap();
    assert_eq!(prefs.font_index().unwrap(), 0);

    for expected in (1..FONTS.len()).chain([0]) {
        assert_eq!(prefs.cycle_font().unwrap(), expected);
    }

    kv.set(keys::THEME, "journal").unwrap();
    assert_eq!(prefs.cycle_font().unwrap(), 0);
    assert_eq!(prefs.font_index().unwrap(), 0);
}

#[test]
fn pomodoro_resumes_after_reload_from_wall_clock_target() {
    let kv = MemoryKvStore::new();
    let start = 1_000_000;
    Preferences::new(&kv).toggle_pomodoro(start).unwrap();

    let reloaded = Preferences::new(&kv);
    let status = reloaded.pomodoro_status(start + 60_000).unwrap();
    assert_eq!(
        status,
        PomodoroStatus::Running {
            remaining_ms: POMODORO_DURATION_MS - 60_000
        }
    );
    assert_eq!(status.label(), "24:00");
}

#[test]
fn pomodoro_toggle_cancels_and_expiry_clears_target() {
    let kv = MemoryKvStore::new();
    let prefs = Preferences::new(&kv);

    prefs.toggle_pomodoro(0).unwrap();
    assert_eq!(prefs.toggle_pomodoro(10).unwrap(), PomodoroStatus::Idle);
    assert!(kv.get(keys::POMODORO_TARGET).unwrap().is_none());

    prefs.toggle_pomodoro(0).unwrap();
    assert_eq!(
        prefs.pomodoro_status(POMODORO_DURATION_MS).unwrap(),
        PomodoroStatus::Finished
    );
    assert_eq!(prefs.pomodoro_status(POMODORO_DURATION_MS).unwrap(), PomodoroStatus::Idle);
}

#[test]
fn unreadable_language_falls_back_to_portuguese() {
    // No migrations: every read fails with "no such table".
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let prefs = Preferences::new(SqliteKvStore::new(&conn));

    assert!(matches!(prefs.language(), Err(PreferenceError::Storage(_))));
    assert_eq!(prefs.language_or_default(), Language::Pt);
}
