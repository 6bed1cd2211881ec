//! Shared-secret session guard.
//!
//! # Responsibility
//! - Gate the application behind one shared secret.
//! - Persist the explicit-lock flag so a reload keeps a locked session locked.
//! - Confirm the destructive reset with the current secret.
//! - Tell callers whether document commands may run.
//!
//! # Invariants
//! - With a secret stored and the locked flag not exactly `"true"`, startup
//!   resolves to `Unlocked` without prompting.
//! - A rejected attempt never changes state; attempts are unlimited.
//! - Document commands run only in `Unlocked`.
//! - The secret is stored and compared verbatim (no hashing).

use crate::storage::{clear_application_keys, keys, KvStore, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const LOCKED_TRUE: &str = "true";
const LOCKED_FALSE: &str = "false";

pub type GuardResult<T> = Result<T, GuardError>;

/// Visibility state of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// `start` has not run yet.
    Unconfigured,
    /// No secret stored; waiting for the user to create one.
    Setup,
    /// Secret stored and the user locked explicitly.
    Locked,
    Unlocked,
}

#[derive(Debug)]
pub enum GuardError {
    /// Setup secret is empty or whitespace only.
    EmptySecret,
    /// Setup entries differ.
    SecretMismatch,
    /// Setup attempted while a secret already exists.
    AlreadyConfigured,
    /// Operation needs a secret and none is stored.
    NotConfigured,
    /// Session is locked; unlock first.
    Locked,
    /// Wrong secret on unlock or reset confirmation.
    Rejected,
    Storage(StorageError),
}

impl Display for GuardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "secret must not be empty"),
            Self::SecretMismatch => write!(f, "secret entries do not match"),
            Self::AlreadyConfigured => write!(f, "a secret is already configured"),
            Self::NotConfigured => write!(f, "no secret is configured"),
            Self::Locked => write!(f, "session is locked"),
            Self::Rejected => write!(f, "wrong secret"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GuardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for GuardError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Lock-screen state machine over persisted secret and locked flag.
pub struct SessionGuard<S: KvStore> {
    storage: S,
    state: GuardState,
}

impl<S: KvStore> SessionGuard<S> {
    /// Creates a guard in `Unconfigured`; call [`SessionGuard::start`] next.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: GuardState::Unconfigured,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Whether a secret is stored.
    pub fn is_configured(&self) -> GuardResult<bool> {
        Ok(self.stored_secret()?.is_some())
    }

    /// Resolves the startup state from storage.
    pub fn start(&mut self) -> GuardResult<GuardState> {
        self.state = if self.stored_secret()?.is_none() {
            GuardState::Setup
        } else if self.storage.get(keys::LOCKED)?.as_deref() == Some(LOCKED_TRUE) {
            GuardState::Locked
        } else {
            self.storage.set(keys::LOCKED, LOCKED_FALSE)?;
            GuardState::Unlocked
        };

        info!(
            "event=guard_start module=guard status=ok state={:?}",
            self.state
        );
        Ok(self.state)
    }

    /// Stores a new secret entered twice and unlocks.
    pub fn setup(&mut self, first: &str, second: &str) -> GuardResult<GuardState> {
        if self.stored_secret()?.is_some() {
            return Err(GuardError::AlreadyConfigured);
        }
        if first.trim().is_empty() {
            return Err(GuardError::EmptySecret);
        }
        if first != second {
            return Err(GuardError::SecretMismatch);
        }

        self.storage.set(keys::AUTH_SECRET, first)?;
        self.storage.set(keys::LOCKED, LOCKED_FALSE)?;
        self.state = GuardState::Unlocked;
        info!("event=guard_setup module=guard status=ok");
        Ok(self.state)
    }

    /// Locks explicitly; survives reloads until the next unlock.
    pub fn lock(&mut self) -> GuardResult<GuardState> {
        if self.stored_secret()?.is_none() {
            return Err(GuardError::NotConfigured);
        }
        self.storage.set(keys::LOCKED, LOCKED_TRUE)?;
        self.state = GuardState::Locked;
        info!("event=guard_lock module=guard status=ok");
        Ok(self.state)
    }

    /// Unlocks when `attempt` equals the stored secret.
    ///
    /// # Errors
    /// - `GuardError::Rejected` on mismatch; the state stays unchanged.
    pub fn unlock(&mut self, attempt: &str) -> GuardResult<GuardState> {
        let Some(secret) = self.stored_secret()? else {
            return Err(GuardError::NotConfigured);
        };
        if attempt != secret {
            warn!("event=guard_unlock module=guard status=rejected");
            return Err(GuardError::Rejected);
        }

        self.storage.set(keys::LOCKED, LOCKED_FALSE)?;
        self.state = GuardState::Unlocked;
        info!("event=guard_unlock module=guard status=ok");
        Ok(self.state)
    }

    /// Resolves the startup state and fails unless the session is unlocked.
    ///
    /// # Errors
    /// - `GuardError::NotConfigured` while no secret exists.
    /// - `GuardError::Locked` after an explicit lock.
    pub fn ensure_unlocked(&mut self) -> GuardResult<()> {
        match self.start()? {
            GuardState::Unlocked => Ok(()),
            GuardState::Locked => Err(GuardError::Locked),
            GuardState::Setup | GuardState::Unconfigured => Err(GuardError::NotConfigured),
        }
    }

    /// Wipes all persisted application data after confirming the secret.
    ///
    /// The secret is checked before anything is read or written. On success
    /// the guard returns to `Unconfigured` and callers reinitialize their
    /// stores.
    ///
    /// # Errors
    /// - `GuardError::NotConfigured` when no secret exists to confirm with.
    /// - `GuardError::Rejected` on mismatch; nothing is removed.
    pub fn confirm_hard_reset(&mut self, attempt: &str) -> GuardResult<()> {
        let Some(secret) = self.stored_secret()? else {
            return Err(GuardError::NotConfigured);
        };
        if attempt != secret {
            warn!("event=guard_reset module=guard status=rejected");
            return Err(GuardError::Rejected);
        }

        clear_application_keys(&self.storage)?;
        self.state = GuardState::Unconfigured;
        warn!(
            "event=guard_reset module=guard status=ok keys={}",
            keys::ALL.len()
        );
        Ok(())
    }

    fn stored_secret(&self) -> GuardResult<Option<String>> {
        Ok(self
            .storage
            .get(keys::AUTH_SECRET)?
            .filter(|secret| !secret.is_empty()))
    }
}
