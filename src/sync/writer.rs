//! Outbound writer — stages an agent-modified note as a Markdown file for the
//! external app to re-import.
//!
//! After writing, the caller is held for a settle delay so the external
//! watcher notices the file before any immediately-following operation (such
//! as a triggered re-sync) runs. The delay is an awaited sleep; it never
//! blocks the reconciliation engine or sibling tool calls.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notes::materialize::{note_to_markdown, sanitize_filename};
use crate::notes::types::{Note, DEFAULT_NOTEBOOK};

/// Write the note under `<import_dir>/<notebook>/<slug>.md` (notebook
/// subdirectory omitted for the sentinel notebook), then wait out the settle
/// delay. Returns the staged path.
pub async fn write_note_to_staging(
    note: &Note,
    import_dir: &Path,
    settle_delay: Duration,
) -> Result<PathBuf> {
    let filename = sanitize_filename(&note.title);
    let dir = if !note.notebook.is_empty() && note.notebook != DEFAULT_NOTEBOOK {
        import_dir.join(&note.notebook)
    } else {
        import_dir.to_path_buf()
    };

    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(filename);
    tokio::fs::write(&path, note_to_markdown(note))
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "note staged for import");

    tokio::time::sleep(settle_delay).await;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, notebook: &str, content: &str) -> Note {
        Note {
            id: "id".into(),
            title: title.into(),
            notebook: notebook.into(),
            tags: vec![],
            content: content.into(),
            raw_front_matter: String::new(),
            file_path: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[tokio::test]
    async fn stages_under_notebook_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let n = note("Ship It", "work", "body");

        let path = write_note_to_staging(&n, dir.path(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("work/ship-it.md"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "# Ship It\n\nbody");
    }

    #[tokio::test]
    async fn default_notebook_stages_at_root() {
        let dir = tempfile::tempdir().unwrap();
        let n = note("Loose Note", DEFAULT_NOTEBOOK, "body");

        let path = write_note_to_staging(&n, dir.path(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("loose-note.md"));
    }
}
