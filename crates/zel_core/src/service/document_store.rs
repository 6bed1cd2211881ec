//! Persisted document store.
//!
//! # Responsibility
//! - Own the document collection, the active selection and the global memo.
//! - Funnel every durable write through one JSON blob in `KvStore`.
//! - Provide backup import/export and destructive reset.
//!
//! # Invariants
//! - `projects` never contains duplicate ids.
//! - An unspecified save field never clobbers stored data.
//! - Every mutation is persisted before the method returns.
//! - Malformed persisted or imported data never escapes as a panic; it is
//!   reported as a value.

use crate::export::share::{generate_share_link, ShareError};
use crate::export::text::html_to_text;
use crate::model::document::{Document, DocumentId, StateValidationError, StoreState};
use crate::model::{system_clock, Clock};
use crate::storage::{clear_application_keys, keys, KvStore, StorageError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation failure.
#[derive(Debug)]
pub enum StoreError {
    /// Backing storage could not be read or written.
    Storage(StorageError),
    /// Import payload rejected; in-memory state is untouched.
    InvalidBackup(StateValidationError),
    /// State could not be serialized.
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidBackup(err) => write!(f, "invalid backup: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize store state: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::InvalidBackup(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Partial update applied by [`DocumentStore::save`].
///
/// `None` leaves a field untouched; `Some(String::new())` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRequest {
    /// New body of the active document.
    pub content: Option<String>,
    /// New global memo.
    pub memo: Option<String>,
    /// New caret offset of the active document.
    pub cursor_pos: Option<u64>,
}

/// How `initialize` obtained its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Persisted state was present and valid.
    Restored,
    /// Nothing persisted; a default document was created and saved.
    Seeded,
    /// Persisted state was malformed; a default document lives in memory
    /// only and the stored blob is left as found.
    Recovered,
}

/// Single source of truth for documents and the memo.
pub struct DocumentStore<S: KvStore> {
    storage: S,
    state: StoreState,
    clock: Clock,
    load_outcome: LoadOutcome,
}

impl<S: KvStore> DocumentStore<S> {
    /// Loads state from `storage`, seeding a default document when needed.
    ///
    /// # Errors
    /// - Only storage transport failures; malformed data degrades to the
    ///   default state.
    pub fn initialize(storage: S) -> StoreResult<Self> {
        Self::initialize_with_clock(storage, system_clock)
    }

    /// Same as [`DocumentStore::initialize`] with an injected clock.
    pub fn initialize_with_clock(storage: S, clock: Clock) -> StoreResult<Self> {
        let now = clock();
        let (state, load_outcome) = match storage.get(keys::STATE)? {
            None => (StoreState::seeded(now), LoadOutcome::Seeded),
            Some(raw) => match StoreState::from_json(&raw) {
                Ok(mut state) => {
                    if state.projects.is_empty() {
                        state.active_id = None;
                    }
                    (state, LoadOutcome::Restored)
                }
                Err(err) => {
                    warn!(
                        "event=store_init module=store status=degraded error_code=state_malformed error={}",
                        err
                    );
                    (StoreState::seeded(now), LoadOutcome::Recovered)
                }
            },
        };

        let store = Self {
            storage,
            state,
            clock,
            load_outcome,
        };
        if load_outcome == LoadOutcome::Seeded {
            store.persist()?;
        }

        info!(
            "event=store_init module=store status=ok outcome={:?} documents={}",
            load_outcome,
            store.state.projects.len()
        );
        Ok(store)
    }

    /// How the current state was obtained at startup.
    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    /// Canonical state, also the backup shape.
    pub fn data(&self) -> &StoreState {
        &self.state
    }

    pub fn documents(&self) -> &[Document] {
        &self.state.projects
    }

    pub fn memo(&self) -> &str {
        &self.state.memo
    }

    pub fn active_id(&self) -> Option<&str> {
        self.state.active_id.as_deref()
    }

    /// Applies a partial update and persists.
    ///
    /// Content and cursor apply to the active document only and are dropped
    /// when no document is active. The memo is global.
    pub fn save(&mut self, request: SaveRequest) -> StoreResult<()> {
        let SaveRequest {
            content,
            memo,
            cursor_pos,
        } = request;

        if let Some(memo) = memo {
            self.state.memo = memo;
        }

        if content.is_some() || cursor_pos.is_some() {
            let now = (self.clock)();
            let active_id = self.state.active_id.clone();
            match active_id
                .as_deref()
                .and_then(|id| self.state.find_mut(id))
            {
                Some(document) => {
                    if let Some(content) = content {
                        document.content = content;
                    }
                    if let Some(cursor_pos) = cursor_pos {
                        document.cursor_pos = cursor_pos;
                    }
                    document.touch(now);
                }
                None => debug!("event=store_save module=store status=skipped reason=no_active"),
            }
        }

        self.persist()
    }

    /// Creates a document at the top of the list and makes it active.
    pub fn create_document(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<Document> {
        let now = (self.clock)();
        let mut document = Document::new(name, content, now);
        // Imported ids are arbitrary strings.
        while self.state.find(&document.id).is_some() {
            document = Document::new(document.name, document.content, now);
        }

        self.state.projects.insert(0, document.clone());
        self.state.active_id = Some(document.id.clone());
        self.persist()?;

        info!(
            "event=document_create module=store status=ok documents={}",
            self.state.projects.len()
        );
        Ok(document)
    }

    /// Selects a document without checking that it exists.
    ///
    /// Dangling selections are healed by [`DocumentStore::get_active`].
    pub fn set_active(&mut self, id: impl Into<DocumentId>) -> StoreResult<()> {
        self.state.active_id = Some(id.into());
        self.persist()
    }

    /// Returns the active document, healing the selection first.
    ///
    /// When the selection is empty or dangling, the first document becomes
    /// active (persisted). Returns `None` only when there are no documents.
    pub fn get_active(&mut self) -> StoreResult<Option<&Document>> {
        let resolves = self
            .state
            .active_id
            .as_deref()
            .is_some_and(|id| self.state.find(id).is_some());

        if !resolves {
            let healed = self.state.first_id();
            if healed != self.state.active_id {
                debug!(
                    "event=store_heal_active module=store status=ok has_documents={}",
                    healed.is_some()
                );
                self.state.active_id = healed;
                self.persist()?;
            }
        }

        Ok(self
            .state
            .active_id
            .as_deref()
            .and_then(|id| self.state.find(id)))
    }

    /// Renames a document; returns `false` when the id is unknown.
    pub fn rename_document(&mut self, id: &str, new_name: impl Into<String>) -> StoreResult<bool> {
        let now = (self.clock)();
        let Some(document) = self.state.find_mut(id) else {
            return Ok(false);
        };
        document.name = new_name.into();
        document.touch(now);
        self.persist()?;
        Ok(true)
    }

    /// Deletes a document; returns whether one was removed.
    ///
    /// Deleting the active document selects the new first document, or
    /// nothing when none remain.
    pub fn delete_document(&mut self, id: &str) -> StoreResult<bool> {
        let before = self.state.projects.len();
        self.state.projects.retain(|document| document.id != id);
        let removed = self.state.projects.len() != before;

        if self.state.active_id.as_deref() == Some(id) {
            self.state.active_id = self.state.first_id();
        }
        self.persist()?;

        if removed {
            info!(
                "event=document_delete module=store status=ok documents={}",
                self.state.projects.len()
            );
        }
        Ok(removed)
    }

    /// Replaces the whole state with a backup blob.
    ///
    /// # Errors
    /// - `StoreError::InvalidBackup` for unparsable JSON, missing or
    ///   non-sequence `projects`, or duplicate ids. State is untouched.
    pub fn import_backup(&mut self, blob: &str) -> StoreResult<()> {
        let mut imported = match StoreState::from_json(blob) {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    "event=backup_import module=store status=rejected error={}",
                    err
                );
                return Err(StoreError::InvalidBackup(err));
            }
        };
        if imported.projects.is_empty() {
            imported.active_id = None;
        }

        self.state = imported;
        self.persist()?;
        info!(
            "event=backup_import module=store status=ok documents={}",
            self.state.projects.len()
        );
        Ok(())
    }

    /// Serializes the canonical state for a backup download.
    pub fn export_backup(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    /// Imports a non-backup file as a new active document named after it.
    pub fn import_text_file(
        &mut self,
        file_name: &str,
        text: impl Into<String>,
    ) -> StoreResult<Document> {
        self.create_document(file_name, text)
    }

    /// Plain text of the active document, for `.txt` export.
    pub fn export_plain_text(&mut self) -> StoreResult<Option<String>> {
        Ok(self
            .get_active()?
            .map(|document| html_to_text(&document.content)))
    }

    /// Builds a compressed share link carrying `text`.
    pub fn generate_share_link(&self, base_url: &str, text: &str) -> Result<String, ShareError> {
        generate_share_link(base_url, text)
    }

    /// Removes every application key from storage.
    ///
    /// In-memory state is left as is; callers reinitialize afterwards.
    pub fn hard_reset(&self) -> StoreResult<()> {
        clear_application_keys(&self.storage)?;
        warn!("event=hard_reset module=store status=ok keys={}", keys::ALL.len());
        Ok(())
    }

    /// Writes the current state to storage.
    pub fn persist(&self) -> StoreResult<()> {
        let raw = serde_json::to_string(&self.state)?;
        self.storage.set(keys::STATE, &raw)?;
        Ok(())
    }
}
