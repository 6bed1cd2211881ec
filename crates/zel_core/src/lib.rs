//! Core domain logic for ZEL.
//! This crate is the single source of truth for document and session invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use config::AppConfig;
pub use export::share::{decode_share_payload, share_payload_from_link, ShareError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{
    Document, DocumentDate, DocumentId, StateValidationError, StoreState, DEFAULT_DOCUMENT_NAME,
};
pub use service::document_store::{
    DocumentStore, LoadOutcome, SaveRequest, StoreError, StoreResult,
};
pub use service::preferences::{Language, PomodoroStatus, PreferenceError, Preferences};
pub use service::session_guard::{GuardError, GuardResult, GuardState, SessionGuard};
pub use storage::{
    clear_application_keys, keys, KvStore, MemoryKvStore, SqliteKvStore, StorageError,
    StorageResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
