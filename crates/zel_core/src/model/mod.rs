//! Persisted domain model.
//!
//! # Responsibility
//! - Define the document and store-state shapes shared by persistence,
//!   backup files and UI callers.
//!
//! # Invariants
//! - The serialized shape of `StoreState` is the canonical backup format.
//! - Every document is identified by a stable `DocumentId`.

pub mod document;

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in epoch milliseconds.
pub type Clock = fn() -> i64;

/// Wall-clock time in epoch milliseconds; `0` if the clock predates 1970.
pub fn system_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
