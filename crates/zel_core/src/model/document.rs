//! Document and store-state model.
//!
//! # Responsibility
//! - Define `Document` (a "project") and `StoreState` with their JSON shape.
//! - Validate structural invariants of loaded or imported state.
//!
//! # Invariants
//! - `StoreState::projects` never holds two documents with the same id.
//! - An empty `projects` list implies no `active_id`.
//! - `date` is refreshed by every content, cursor or name mutation.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque document identifier.
///
/// New documents receive UUID v4 strings; imported ids of any shape are kept.
pub type DocumentId = String;

/// Name given to the document seeded on first run.
pub const DEFAULT_DOCUMENT_NAME: &str = "Initial Draft";

/// One unit of user-authored text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    /// Rich-text/HTML body; may be empty.
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    /// Last known caret offset. Best-effort, may be stale.
    #[serde(default)]
    pub cursor_pos: u64,
    /// Last modification; see [`DocumentDate`].
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: DocumentDate,
}

/// Last-modified stamp of a document.
///
/// Dates written by this crate are epoch milliseconds. Older backups carry
/// locale-formatted strings; those are kept verbatim so an import followed
/// by an export reproduces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentDate {
    Millis(i64),
    Legacy(String),
}

impl DocumentDate {
    /// Epoch milliseconds, or `None` for a legacy text date.
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Self::Millis(value) => Some(*value),
            Self::Legacy(_) => None,
        }
    }
}

impl Default for DocumentDate {
    fn default() -> Self {
        Self::Millis(0)
    }
}

impl From<i64> for DocumentDate {
    fn from(value: i64) -> Self {
        Self::Millis(value)
    }
}

impl Document {
    /// Creates a document with a freshly generated id.
    pub fn new(name: impl Into<String>, content: impl Into<String>, now_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, content, now_ms)
    }

    /// Creates a document with a caller-provided id.
    pub fn with_id(
        id: impl Into<DocumentId>,
        name: impl Into<String>,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            cursor_pos: 0,
            date: DocumentDate::Millis(now_ms),
        }
    }

    /// Refreshes the last-modified timestamp.
    pub fn touch(&mut self, now_ms: i64) {
        self.date = DocumentDate::Millis(now_ms);
    }
}

/// Full persisted state; also the backup file shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// Newest-created first.
    pub projects: Vec<Document>,
    #[serde(default)]
    pub active_id: Option<DocumentId>,
    /// Global scratch note, independent of any document.
    #[serde(default, deserialize_with = "nullable_string")]
    pub memo: String,
}

impl StoreState {
    /// First-run state: one default document, active.
    pub fn seeded(now_ms: i64) -> Self {
        let document = Document::new(DEFAULT_DOCUMENT_NAME, "", now_ms);
        Self {
            active_id: Some(document.id.clone()),
            projects: vec![document],
            memo: String::new(),
        }
    }

    /// Parses and validates a serialized state blob.
    pub fn from_json(raw: &str) -> Result<Self, StateValidationError> {
        let state: Self = serde_json::from_str(raw)
            .map_err(|err| StateValidationError::Malformed(err.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    /// Checks structural invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), StateValidationError> {
        let mut seen = HashSet::with_capacity(self.projects.len());
        for document in &self.projects {
            if !seen.insert(document.id.as_str()) {
                return Err(StateValidationError::DuplicateId(document.id.clone()));
            }
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&Document> {
        self.projects.iter().find(|document| document.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.projects.iter_mut().find(|document| document.id == id)
    }

    /// Id of the first document, if any.
    pub fn first_id(&self) -> Option<DocumentId> {
        self.projects.first().map(|document| document.id.clone())
    }
}

/// Reason a state blob was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValidationError {
    /// Not JSON, or `projects` missing / not a sequence / wrong field types.
    Malformed(String),
    DuplicateId(DocumentId),
}

impl Display for StateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed state: {message}"),
            Self::DuplicateId(id) => write!(f, "duplicate document id `{id}`"),
        }
    }
}

impl Error for StateValidationError {}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

/// Accepts epoch milliseconds (integral, fractional or numeric text);
/// any other text is kept as a legacy date.
fn lenient_date<'de, D>(deserializer: D) -> Result<DocumentDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Millis(value)) => DocumentDate::Millis(value),
        Some(RawTimestamp::Fractional(value)) => DocumentDate::Millis(value as i64),
        Some(RawTimestamp::Text(text)) => match text.trim().parse::<i64>() {
            Ok(value) => DocumentDate::Millis(value),
            Err(_) => DocumentDate::Legacy(text),
        },
        None => DocumentDate::default(),
    })
}
