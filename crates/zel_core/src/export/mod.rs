//! Export formats: backup/text file naming, plain-text rendering, share links.
//!
//! # Responsibility
//! - Turn store data into the artifacts a user downloads or shares.
//! - Stay free of storage access; callers pass in the data to export.

pub mod share;
pub mod text;

/// Download name for a JSON backup, e.g. `ZEL_BACKUP_1700000000000.json`.
pub fn backup_file_name(now_ms: i64) -> String {
    format!("ZEL_BACKUP_{now_ms}.json")
}

/// Download name for a plain-text export, e.g. `ZEL_Doc_1700000000000.txt`.
pub fn text_file_name(now_ms: i64) -> String {
    format!("ZEL_Doc_{now_ms}.txt")
}

/// Whether an imported file should be treated as a full backup.
///
/// Anything else is imported as the content of a new document.
pub fn is_backup_file_name(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".json")
}
