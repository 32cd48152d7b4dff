//! Index store — persisted note records plus scalar sync metadata.
//!
//! All operations are free functions over a [`Connection`]. Upserts replace
//! the full row in a single statement, so concurrent readers never observe a
//! partially-written record. Reads never mutate.

use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::notes::types::{Note, NoteSummary};

/// Insert or fully replace a note by id.
pub fn upsert_note(conn: &Connection, note: &Note) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO notes \
         (id, title, notebook, tags, content, raw_front_matter, file_path, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            note.id,
            note.title,
            note.notebook,
            serde_json::to_string(&note.tags)?,
            note.content,
            note.raw_front_matter,
            note.file_path,
            note.created_at,
            note.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_note_by_id(conn: &Connection, id: &str) -> Result<Option<Note>> {
    let note = conn
        .query_row("SELECT * FROM notes WHERE id = ?1", params![id], row_to_note)
        .optional()?;
    Ok(note)
}

/// Case-insensitive exact title match.
pub fn get_note_by_title(conn: &Connection, title: &str) -> Result<Option<Note>> {
    let note = conn
        .query_row(
            "SELECT * FROM notes WHERE title = ?1 COLLATE NOCASE",
            params![title],
            row_to_note,
        )
        .optional()?;
    Ok(note)
}

/// Substring search over title and content, restricted to the given notebooks,
/// most-recently-updated first.
pub fn search_notes(
    conn: &Connection,
    query: &str,
    notebooks: &[String],
    limit: usize,
    offset: usize,
    excerpt_chars: usize,
) -> Result<Vec<NoteSummary>> {
    if notebooks.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (2..2 + notebooks.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT * FROM notes \
         WHERE (title LIKE ?1 OR content LIKE ?1) AND notebook IN ({placeholders}) \
         ORDER BY updated_at DESC LIMIT ?{} OFFSET ?{}",
        2 + notebooks.len(),
        3 + notebooks.len(),
    );

    let term = format!("%{query}%");
    let mut values: Vec<Value> = Vec::with_capacity(notebooks.len() + 3);
    values.push(Value::Text(term));
    for nb in notebooks {
        values.push(Value::Text(nb.clone()));
    }
    values.push(Value::Integer(limit as i64));
    values.push(Value::Integer(offset as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            row_to_summary(row, excerpt_chars)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All notes in one notebook, most-recently-updated first.
pub fn list_notes_by_notebook(
    conn: &Connection,
    notebook: &str,
    limit: usize,
    offset: usize,
    excerpt_chars: usize,
) -> Result<Vec<NoteSummary>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM notes WHERE notebook = ?1 \
         ORDER BY updated_at DESC LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![notebook, limit as i64, offset as i64], |row| {
            row_to_summary(row, excerpt_chars)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Distinct notebook names with note counts, sorted by name.
pub fn list_notebooks(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT notebook, COUNT(*) FROM notes GROUP BY notebook ORDER BY notebook",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_note(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
    Ok(())
}

/// Last successful sync timestamp, if any cycle has completed.
pub fn get_last_sync(conn: &Connection) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM sync_meta WHERE key = 'last_sync'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_last_sync(conn: &Connection, timestamp: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sync_meta (key, value) VALUES ('last_sync', ?1)",
        params![timestamp],
    )?;
    Ok(())
}

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let tags_json: String = row.get("tags")?;
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        notebook: row.get("notebook")?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        content: row.get("content")?,
        raw_front_matter: row.get("raw_front_matter")?,
        file_path: row.get("file_path")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_summary(row: &Row<'_>, excerpt_chars: usize) -> rusqlite::Result<NoteSummary> {
    let tags_json: String = row.get("tags")?;
    let content: String = row.get("content")?;
    Ok(NoteSummary {
        id: row.get("id")?,
        title: row.get("title")?,
        notebook: row.get("notebook")?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        updated_at: row.get("updated_at")?,
        excerpt: excerpt(&content, excerpt_chars),
    })
}

/// Char-boundary-safe excerpt of the first `max_chars` characters.
fn excerpt(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => content[..idx].to_string(),
        None => content.to_string(),
    }
}
