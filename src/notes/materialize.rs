//! Note materializer — turns a single extracted Markdown file into a
//! canonical [`Note`] record.
//!
//! Identity, notebook, title, tags, and timestamps are derived from a
//! priority-ordered set of sources: front matter first, then content
//! heuristics, then filesystem metadata and path structure. The derivation is
//! pure given (bytes, path, root) except for the filesystem-time fallback.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::SystemTime;

use crate::notes::frontmatter::{parse_front_matter, MetaValue};
use crate::notes::types::{Note, DEFAULT_NOTEBOOK};

/// Content-independent note id: SHA-256 hex of the `/`-normalized relative
/// path. The same relative path must always hash to the same id, so repeated
/// syncs reconcile instead of duplicating.
pub fn generate_id(relative_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Materialize a note from a file under the archive extraction root.
pub fn note_from_file(path: &Path, root: &Path) -> Result<Note> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = parse_front_matter(&raw);

    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is not under {}", path.display(), root.display()))?;
    let relative = normalize_separators(relative);

    // Notebook = first path segment under the root; root-level files fall
    // into the sentinel group.
    let notebook = match relative.split_once('/') {
        Some((first, _)) if !first.is_empty() => first.to_string(),
        _ => DEFAULT_NOTEBOOK.to_string(),
    };

    // Title: front matter > first `# heading` in the body > de-slugged filename
    let title = doc
        .meta
        .get("title")
        .and_then(MetaValue::as_scalar)
        .map(str::to_string)
        .or_else(|| first_heading(&doc.body))
        .unwrap_or_else(|| title_from_filename(path));

    // Id: front matter > hash of the relative path (stable across syncs)
    let id = doc
        .meta
        .get("id")
        .and_then(MetaValue::as_scalar)
        .map(str::to_string)
        .unwrap_or_else(|| generate_id(&relative));

    let tags = match doc.meta.get("tags") {
        Some(MetaValue::List(list)) => list.clone(),
        Some(MetaValue::Scalar(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    };

    // Dates: front matter > filesystem times
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    let created_at = doc
        .meta
        .get("created")
        .and_then(MetaValue::as_scalar)
        .map(str::to_string)
        .unwrap_or_else(|| {
            // Birth time is unavailable on some filesystems; mtime stands in.
            to_rfc3339(metadata.created().or_else(|_| metadata.modified()))
        });
    let updated_at = doc
        .meta
        .get("updated")
        .and_then(MetaValue::as_scalar)
        .map(str::to_string)
        .unwrap_or_else(|| to_rfc3339(metadata.modified()));

    Ok(Note {
        id,
        title,
        notebook,
        tags,
        content: doc.body,
        raw_front_matter: doc.raw_front_matter,
        file_path: path.to_string_lossy().into_owned(),
        created_at,
        updated_at,
    })
}

/// Render a note back to Markdown, prefixing a `# Title` heading unless the
/// content already starts with that exact heading — repeated round-trips must
/// not stack headings.
pub fn note_to_markdown(note: &Note) -> String {
    let body = note.content.trim_start();
    let heading = format!("# {}", note.title);
    if body.starts_with(&heading) {
        body.to_string()
    } else {
        format!("{heading}\n\n{body}")
    }
}

/// Slug a title into a staging filename: lowercase, whitespace runs to a
/// hyphen, strip everything outside `[a-z0-9-_]`, bounded length, `.md`.
pub fn sanitize_filename(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                slug.push(c);
            }
        }
    }
    slug.truncate(80);
    format!("{slug}.md")
}

fn normalize_separators(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// First `# heading` line anywhere in the body, trimmed.
fn first_heading(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        let rest = line.strip_prefix('#')?;
        if rest.starts_with(' ') || rest.starts_with('\t') {
            let text = rest.trim();
            (!text.is_empty()).then(|| text.to_string())
        } else {
            None
        }
    })
}

fn title_from_filename(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(['-', '_'], " "))
        .unwrap_or_default()
}

fn to_rfc3339(time: std::io::Result<SystemTime>) -> String {
    let time = time.unwrap_or(SystemTime::UNIX_EPOCH);
    DateTime::<Utc>::from(time).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic_and_path_only() {
        let a = generate_id("work/todo.md");
        let b = generate_id("work/todo.md");
        let c = generate_id("work/other.md");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64); // sha256 hex
    }

    #[test]
    fn heading_scan_finds_first_h1_only() {
        let body = "intro line\n## sub\n# Real Title\n# Second";
        assert_eq!(first_heading(body), Some("Real Title".to_string()));
        assert_eq!(first_heading("no headings here"), None);
        assert_eq!(first_heading("#not-a-heading"), None);
    }

    #[test]
    fn filename_fallback_deslugs() {
        assert_eq!(
            title_from_filename(Path::new("/x/meeting-notes_q3.md")),
            "meeting notes q3"
        );
    }

    #[test]
    fn serializer_does_not_duplicate_heading() {
        let note = Note {
            id: "x".into(),
            title: "Ship it".into(),
            notebook: "work".into(),
            tags: vec![],
            content: "# Ship it\n\nbody".into(),
            raw_front_matter: String::new(),
            file_path: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(note_to_markdown(&note), "# Ship it\n\nbody");
    }

    #[test]
    fn serializer_prefixes_missing_heading() {
        let note = Note {
            id: "x".into(),
            title: "Ship it".into(),
            notebook: "work".into(),
            tags: vec![],
            content: "body only".into(),
            raw_front_matter: String::new(),
            file_path: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(note_to_markdown(&note), "# Ship it\n\nbody only");
    }

    #[test]
    fn sanitize_filename_slugs_titles() {
        assert_eq!(sanitize_filename("Daily To-Do List"), "daily-to-do-list.md");
        assert_eq!(sanitize_filename("Ship  it!  v2"), "ship-it-v2.md");
        let long = "a".repeat(200);
        assert_eq!(sanitize_filename(&long).len(), 80 + 3);
    }
}
