//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose store, guard and preference commands to Dart via FRB.
//! - Translate core results into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens storage, runs one command and persists before
//!   returning; no state is cached between calls.
//! - Store commands run only while the session is unlocked.
//! - Rejections the user must acknowledge carry a localized message.

use log::warn;
use zel_core::db::open_db;
use zel_core::export::share::fits_qr_code;
use zel_core::export::{backup_file_name, is_backup_file_name, text_file_name};
use zel_core::model::system_clock;
use zel_core::service::preferences::messages;
use zel_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, Document, DocumentDate, DocumentStore, GuardError, GuardState, PomodoroStatus,
    Preferences, SaveRequest, SessionGuard, SqliteKvStore, StoreError,
};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::OnceLock;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_DB_PATH: std::cell::RefCell<Option<PathBuf>> = const { std::cell::RefCell::new(None) };
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Document as shown by the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub id: String,
    pub name: String,
    pub content: String,
    pub cursor_pos: u64,
    /// Last modification in epoch milliseconds; `0` for legacy dates.
    pub date: i64,
    /// Verbatim date text carried over from old backups.
    pub legacy_date: Option<String>,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Response carrying at most one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResponse {
    pub ok: bool,
    pub document: Option<DocumentView>,
    pub message: String,
}

/// Document list plus the global fields the presenter renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub ok: bool,
    /// Newest-created first.
    pub documents: Vec<DocumentView>,
    pub active_id: Option<String>,
    pub memo: String,
    pub message: String,
}

/// Downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub file_name: String,
    pub payload: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareResponse {
    pub ok: bool,
    pub link: String,
    /// `false` when the link is too long to render as a QR code.
    pub fits_qr: bool,
    pub message: String,
}

/// Guard state after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardResponse {
    pub ok: bool,
    /// `unconfigured|setup|locked|unlocked`.
    pub state: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroResponse {
    pub ok: bool,
    /// `idle|running|finished`.
    pub status: String,
    pub remaining_ms: i64,
    /// `MM:SS` countdown label.
    pub label: String,
    pub message: String,
}

/// Lists documents, healing the active selection first.
#[flutter_rust_bridge::frb(sync)]
pub fn store_snapshot() -> StoreSnapshot {
    let result = with_store(|store| {
        store.get_active()?;
        Ok(StoreSnapshot {
            ok: true,
            documents: store.documents().iter().map(to_view).collect(),
            active_id: store.active_id().map(str::to_string),
            memo: store.memo().to_string(),
            message: format!("{} document(s).", store.documents().len()),
        })
    });
    result.unwrap_or_else(|err| StoreSnapshot {
        ok: false,
        documents: Vec::new(),
        active_id: None,
        memo: String::new(),
        message: store_failure_message("store_snapshot", &err),
    })
}

/// Returns the active document, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn store_get_active() -> DocumentResponse {
    match with_store(|store| Ok(store.get_active()?.map(to_view))) {
        Ok(Some(document)) => DocumentResponse {
            ok: true,
            document: Some(document),
            message: "Active document loaded.".to_string(),
        },
        Ok(None) => DocumentResponse {
            ok: true,
            document: None,
            message: "No documents.".to_string(),
        },
        Err(err) => document_failure(store_failure_message("store_get_active", &err)),
    }
}

/// Partial save; `None` fields are left untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn store_save(
    content: Option<String>,
    memo: Option<String>,
    cursor_pos: Option<u64>,
) -> ActionResponse {
    let request = SaveRequest {
        content,
        memo,
        cursor_pos,
    };
    match with_store(|store| store.save(request)) {
        Ok(()) => ActionResponse::success("Saved."),
        Err(err) => ActionResponse::failure(store_failure_message("store_save", &err)),
    }
}

/// Creates and activates a document.
#[flutter_rust_bridge::frb(sync)]
pub fn store_create_document(name: String, content: Option<String>) -> DocumentResponse {
    let name = name.trim().to_string();
    if name.is_empty() {
        return document_failure("store_create_document failed: name must not be empty");
    }
    match with_store(|store| store.create_document(name, content.unwrap_or_default())) {
        Ok(document) => DocumentResponse {
            ok: true,
            document: Some(to_view(&document)),
            message: "Document created.".to_string(),
        },
        Err(err) => document_failure(store_failure_message("store_create_document", &err)),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_set_active(id: String) -> ActionResponse {
    match with_store(|store| store.set_active(id)) {
        Ok(()) => ActionResponse::success("Active document selected."),
        Err(err) => ActionResponse::failure(store_failure_message("store_set_active", &err)),
    }
}

/// Renames a document; blank names and unknown ids leave data unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn store_rename_document(id: String, name: String) -> ActionResponse {
    if name.trim().is_empty() {
        return ActionResponse::success("Blank name ignored.");
    }
    match with_store(|store| store.rename_document(&id, name)) {
        Ok(true) => ActionResponse::success("Document renamed."),
        Ok(false) => ActionResponse::success("Document not found; nothing renamed."),
        Err(err) => ActionResponse::failure(store_failure_message("store_rename_document", &err)),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn store_delete_document(id: String) -> ActionResponse {
    match with_store(|store| store.delete_document(&id)) {
        Ok(true) => ActionResponse::success("Document deleted."),
        Ok(false) => ActionResponse::success("Document not found; nothing deleted."),
        Err(err) => ActionResponse::failure(store_failure_message("store_delete_document", &err)),
    }
}

/// Imports a picked file: `.json` replaces everything, other files become
/// a new document.
#[flutter_rust_bridge::frb(sync)]
pub fn store_import_file(file_name: String, text: String) -> ActionResponse {
    if is_backup_file_name(&file_name) {
        return match with_store(|store| store.import_backup(&text)) {
            Ok(()) => ActionResponse::success("Backup restored."),
            Err(StoreCallError::Store(StoreError::InvalidBackup(err))) => {
                ActionResponse::failure(format!("Invalid or corrupted backup file: {err}"))
            }
            Err(err) => ActionResponse::failure(store_failure_message("store_import_file", &err)),
        };
    }
    match with_store(|store| store.import_text_file(&file_name, text)) {
        Ok(_) => ActionResponse::success("File imported as a new document."),
        Err(err) => ActionResponse::failure(store_failure_message("store_import_file", &err)),
    }
}

/// Full JSON backup.
#[flutter_rust_bridge::frb(sync)]
pub fn store_export_backup() -> ExportResponse {
    match with_store(|store| store.export_backup()) {
        Ok(payload) => ExportResponse {
            ok: true,
            file_name: backup_file_name(system_clock()),
            payload,
            message: "Backup ready.".to_string(),
        },
        Err(err) => export_failure(store_failure_message("store_export_backup", &err)),
    }
}

/// Active document as plain text.
#[flutter_rust_bridge::frb(sync)]
pub fn store_export_text() -> ExportResponse {
    match with_store(|store| store.export_plain_text()) {
        Ok(Some(payload)) => ExportResponse {
            ok: true,
            file_name: text_file_name(system_clock()),
            payload,
            message: "Text export ready.".to_string(),
        },
        Ok(None) => export_failure("No active document to export."),
        Err(err) => export_failure(store_failure_message("store_export_text", &err)),
    }
}

/// Compressed share link for `text`.
#[flutter_rust_bridge::frb(sync)]
pub fn store_share_link(base_url: String, text: String) -> ShareResponse {
    match with_store(|store| Ok(store.generate_share_link(&base_url, &text))) {
        Ok(Ok(link)) => {
            let fits_qr = fits_qr_code(&link);
            let message = if fits_qr {
                "Share link ready."
            } else {
                "Text too long for a QR code."
            };
            ShareResponse {
                ok: true,
                link,
                fits_qr,
                message: message.to_string(),
            }
        }
        Ok(Err(err)) => share_failure(format!("store_share_link failed: {err}")),
        Err(err) => share_failure(store_failure_message("store_share_link", &err)),
    }
}

/// Resolves the startup lock state.
#[flutter_rust_bridge::frb(sync)]
pub fn guard_start() -> GuardResponse {
    guard_command("guard_start", |guard| guard.start())
}

/// Creates the shared secret from two matching entries.
#[flutter_rust_bridge::frb(sync)]
pub fn guard_setup(first: String, second: String) -> GuardResponse {
    guard_command("guard_setup", |guard| guard.setup(&first, &second))
}

#[flutter_rust_bridge::frb(sync)]
pub fn guard_lock() -> GuardResponse {
    guard_command("guard_lock", |guard| guard.lock())
}

#[flutter_rust_bridge::frb(sync)]
pub fn guard_unlock(attempt: String) -> GuardResponse {
    guard_command("guard_unlock", |guard| {
        guard.start()?;
        guard.unlock(&attempt)
    })
}

/// Wipes every persisted key after confirming the current secret.
///
/// Nothing is read or written before the secret matches.
#[flutter_rust_bridge::frb(sync)]
pub fn guard_hard_reset(attempt: String) -> GuardResponse {
    guard_command("guard_hard_reset", |guard| {
        guard.confirm_hard_reset(&attempt)?;
        Ok(guard.state())
    })
}

/// Sets the UI language (`pt|en|es`).
#[flutter_rust_bridge::frb(sync)]
pub fn prefs_set_language(code: String) -> ActionResponse {
    match with_storage(|kv| {
        Preferences::new(kv)
            .set_language(&code)
            .map_err(|err| err.to_string())
    }) {
        Ok(language) => ActionResponse::success(language.code()),
        Err(err) => ActionResponse::failure(format!("prefs_set_language failed: {err}")),
    }
}

/// Advances the theme; the message carries the new theme name.
#[flutter_rust_bridge::frb(sync)]
pub fn prefs_cycle_theme() -> ActionResponse {
    match with_storage(|kv| {
        Preferences::new(kv)
            .cycle_theme()
            .map_err(|err| err.to_string())
    }) {
        Ok(theme) => ActionResponse::success(theme),
        Err(err) => ActionResponse::failure(format!("prefs_cycle_theme failed: {err}")),
    }
}

/// Advances the font; the message carries the new font index.
#[flutter_rust_bridge::frb(sync)]
pub fn prefs_cycle_font() -> ActionResponse {
    match with_storage(|kv| {
        Preferences::new(kv)
            .cycle_font()
            .map_err(|err| err.to_string())
    }) {
        Ok(index) => ActionResponse::success(index.to_string()),
        Err(err) => ActionResponse::failure(format!("prefs_cycle_font failed: {err}")),
    }
}

/// Starts or cancels the pomodoro at `now_ms`.
#[flutter_rust_bridge::frb(sync)]
pub fn pomodoro_toggle(now_ms: i64) -> PomodoroResponse {
    pomodoro_command("pomodoro_toggle", |prefs| prefs.toggle_pomodoro(now_ms))
}

/// Countdown at `now_ms`, recomputed from the persisted target.
#[flutter_rust_bridge::frb(sync)]
pub fn pomodoro_status(now_ms: i64) -> PomodoroResponse {
    pomodoro_command("pomodoro_status", |prefs| prefs.pomodoro_status(now_ms))
}

fn resolve_db_path() -> PathBuf {
    if let Some(path) = test_db_path() {
        return path;
    }
    DB_PATH
        .get_or_init(|| AppConfig::from_env().db_path)
        .clone()
}

#[cfg(test)]
fn test_db_path() -> Option<PathBuf> {
    TEST_DB_PATH.with(|cell| cell.borrow().clone())
}

#[cfg(not(test))]
fn test_db_path() -> Option<PathBuf> {
    None
}

fn with_storage<T>(f: impl FnOnce(SqliteKvStore<'_>) -> Result<T, String>) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("storage open failed: {err}"))?;
    f(SqliteKvStore::new(&conn))
}

/// Why a store command did not complete.
#[derive(Debug)]
enum StoreCallError {
    /// Session gate is closed; carries the localized lock-screen text.
    Gated(&'static str),
    Guard(GuardError),
    Store(StoreError),
}

impl Display for StoreCallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gated(message) => write!(f, "{message}"),
            Self::Guard(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl From<StoreError> for StoreCallError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Runs `f` on a freshly loaded store once the session gate is open.
fn with_store<T>(
    f: impl FnOnce(&mut DocumentStore<SqliteKvStore<'_>>) -> Result<T, StoreError>,
) -> Result<T, StoreCallError> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| StoreError::Storage(err.into()))?;
    let kv = SqliteKvStore::new(&conn);

    if let Err(err) = SessionGuard::new(kv).ensure_unlocked() {
        let text = messages(Preferences::new(kv).language_or_default());
        return Err(match err {
            GuardError::Locked => StoreCallError::Gated(text.locked),
            GuardError::NotConfigured => StoreCallError::Gated(text.create_pass),
            other => StoreCallError::Guard(other),
        });
    }

    let mut store = DocumentStore::initialize(kv)?;
    Ok(f(&mut store)?)
}

fn store_failure_message(name: &str, err: &StoreCallError) -> String {
    match err {
        StoreCallError::Gated(message) => {
            warn!("event=ffi_store module=ffi status=gated command={name}");
            (*message).to_string()
        }
        other => format!("{name} failed: {other}"),
    }
}

fn guard_command(
    name: &str,
    f: impl FnOnce(&mut SessionGuard<SqliteKvStore<'_>>) -> Result<GuardState, GuardError>,
) -> GuardResponse {
    let outcome = with_storage(|kv| {
        let language = Preferences::new(kv).language_or_default();
        let mut guard = SessionGuard::new(kv);
        let result = f(&mut guard);
        Ok((result, guard.state(), language))
    });

    match outcome {
        Ok((Ok(state), _, _)) => GuardResponse {
            ok: true,
            state: guard_state_label(state).to_string(),
            message: "OK".to_string(),
        },
        Ok((Err(GuardError::Rejected), state, language)) => GuardResponse {
            ok: false,
            state: guard_state_label(state).to_string(),
            message: messages(language).wrong_pass.to_string(),
        },
        Ok((Err(err), state, _)) => {
            warn!("event=ffi_guard module=ffi status=error command={name} error={err}");
            GuardResponse {
                ok: false,
                state: guard_state_label(state).to_string(),
                message: format!("{name} failed: {err}"),
            }
        }
        Err(err) => GuardResponse {
            ok: false,
            state: guard_state_label(GuardState::Unconfigured).to_string(),
            message: format!("{name} failed: {err}"),
        },
    }
}

fn pomodoro_command(
    name: &str,
    f: impl FnOnce(
        &Preferences<SqliteKvStore<'_>>,
    ) -> Result<PomodoroStatus, zel_core::PreferenceError>,
) -> PomodoroResponse {
    match with_storage(|kv| f(&Preferences::new(kv)).map_err(|err| err.to_string())) {
        Ok(status) => {
            let (label, remaining_ms) = match status {
                PomodoroStatus::Idle => ("idle", 0),
                PomodoroStatus::Running { remaining_ms } => ("running", remaining_ms),
                PomodoroStatus::Finished => ("finished", 0),
            };
            PomodoroResponse {
                ok: true,
                status: label.to_string(),
                remaining_ms,
                label: status.label(),
                message: "OK".to_string(),
            }
        }
        Err(err) => PomodoroResponse {
            ok: false,
            status: "idle".to_string(),
            remaining_ms: 0,
            label: PomodoroStatus::Idle.label(),
            message: format!("{name} failed: {err}"),
        },
    }
}

fn guard_state_label(state: GuardState) -> &'static str {
    match state {
        GuardState::Unconfigured => "unconfigured",
        GuardState::Setup => "setup",
        GuardState::Locked => "locked",
        GuardState::Unlocked => "unlocked",
    }
}

fn to_view(document: &Document) -> DocumentView {
    DocumentView {
        id: document.id.clone(),
        name: document.name.clone(),
        content: document.content.clone(),
        cursor_pos: document.cursor_pos,
        date: document.date.as_millis().unwrap_or(0),
        legacy_date: match &document.date {
            DocumentDate::Legacy(text) => Some(text.clone()),
            DocumentDate::Millis(_) => None,
        },
    }
}

fn document_failure(message: impl Into<String>) -> DocumentResponse {
    DocumentResponse {
        ok: false,
        document: None,
        message: message.into(),
    }
}

fn export_failure(message: impl Into<String>) -> ExportResponse {
    ExportResponse {
        ok: false,
        file_name: String::new(),
        payload: String::new(),
        message: message.into(),
    }
}

fn share_failure(message: impl Into<String>) -> ShareResponse {
    ShareResponse {
        ok: false,
        link: String::new(),
        fits_qr: false,
        message: message.into(),
    }
}
