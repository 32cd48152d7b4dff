//! Core note-model definitions.
//!
//! Defines [`Note`] (the canonical unit of content), [`NoteSummary`] (the
//! compact search-result form), [`Notebook`], [`SyncReport`] (the outcome of a
//! reconciliation cycle), and the to-do checklist types.

use serde::{Deserialize, Serialize};

/// Notebook name for notes sitting directly at the archive root.
pub const DEFAULT_NOTEBOOK: &str = "Default";

/// A note record, matching the `notes` table schema.
///
/// Never partially updated — any field change produces a full new record
/// sharing the same `id`, persisted via full-replace upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Stable identity: front-matter `id` if present, else a SHA-256 hex of
    /// the note's path relative to the archive root.
    pub id: String,
    pub title: String,
    /// Logical grouping, derived from the first path segment under the
    /// archive root. [`DEFAULT_NOTEBOOK`] for root-level notes.
    pub notebook: String,
    /// Unordered set semantically; insertion order preserved for display.
    pub tags: Vec<String>,
    /// Body text with the front-matter block stripped.
    pub content: String,
    /// Verbatim original front-matter block (including delimiters), or empty.
    pub raw_front_matter: String,
    /// Last known on-disk location.
    pub file_path: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 last-modification timestamp.
    pub updated_at: String,
}

/// A compact search/list result: metadata plus a short content excerpt.
#[derive(Debug, Clone, Serialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub notebook: String,
    pub tags: Vec<String>,
    pub updated_at: String,
    pub excerpt: String,
}

/// A notebook as reported to callers: name, note count, and whether the agent
/// has been granted access.
#[derive(Debug, Clone, Serialize)]
pub struct Notebook {
    pub name: String,
    pub note_count: usize,
    pub enabled: bool,
}

/// The structured outcome of one reconciliation cycle. Always produced — the
/// engine reports archive-level and per-file failures here instead of
/// returning an error.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Files scanned (materialization attempted).
    pub notes_read: usize,
    /// Index upserts performed (new notes plus accepted overwrites).
    pub notes_written: usize,
    /// Accepted overwrites of an existing entry. Ticks on every overwrite —
    /// a coarse audit signal, not proof of a competing edit.
    pub conflicts: usize,
    /// Human-readable error strings, each tagged with the offending path.
    pub errors: Vec<String>,
    /// RFC 3339 completion timestamp.
    pub synced_at: String,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            notes_read: 0,
            notes_written: 0,
            conflicts: 0,
            errors: Vec::new(),
            synced_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

/// One checklist line from the to-do note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    pub done: bool,
    /// RFC 3339 timestamp the item was (re)parsed or added.
    pub added_at: String,
}

/// The to-do list view over the designated singleton note's content.
#[derive(Debug, Clone, Serialize)]
pub struct TodoList {
    pub items: Vec<TodoItem>,
    pub updated_at: String,
}
