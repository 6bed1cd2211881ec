//! Core use-case services.
//!
//! # Responsibility
//! - Expose typed command handlers for the UI layer.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod document_store;
pub mod preferences;
pub mod session_guard;
