//! String-keyed key-value storage shared by store, guard and preferences.
//!
//! # Responsibility
//! - Define the `KvStore` contract every persisted component writes through.
//! - Own the well-known key names of the application.
//!
//! # Invariants
//! - Writes are synchronous and last-write-wins.
//! - `remove` of an absent key is not an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

/// Well-known storage keys.
pub mod keys {
    /// JSON-serialized document store state.
    pub const STATE: &str = "zel_data";
    /// Plaintext shared secret.
    pub const AUTH_SECRET: &str = "lit_auth_key";
    /// `"true"` when the user locked explicitly.
    pub const LOCKED: &str = "lit_is_locked";
    pub const LANGUAGE: &str = "lit_lang";
    pub const THEME: &str = "lit_theme_pref";
    pub const FONT_INDEX: &str = "lit_pref_font";
    /// Pomodoro target as epoch milliseconds; absent when idle.
    pub const POMODORO_TARGET: &str = "lit_pomo_target";

    /// Every key removed by a hard reset.
    pub const ALL: &[&str] = &[
        STATE,
        AUTH_SECRET,
        LOCKED,
        LANGUAGE,
        THEME,
        FONT_INDEX,
        POMODORO_TARGET,
    ];
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Transport failure of a storage backend.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "storage backend failure: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value backend contract.
///
/// Methods take `&self` so one backend can be shared by several components
/// through plain references.
pub trait KvStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

/// Removes every key in [`keys::ALL`].
pub fn clear_application_keys<S: KvStore + ?Sized>(storage: &S) -> StorageResult<()> {
    for key in keys::ALL {
        storage.remove(key)?;
    }
    Ok(())
}
