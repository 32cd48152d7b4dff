pub mod configure_notebook_access;
pub mod create_note;
pub mod get_note;
pub mod get_todo;
pub mod list_notebooks;
pub mod search_notes;
pub mod trigger_sync;
pub mod update_note;
pub mod update_todo;

use configure_notebook_access::ConfigureNotebookAccessParams;
use create_note::CreateNoteParams;
use get_note::GetNoteParams;
use get_todo::GetTodoParams;
use list_notebooks::ListNotebooksParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use search_notes::SearchNotesParams;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use trigger_sync::TriggerSyncParams;
use update_note::UpdateNoteParams;
use update_todo::UpdateTodoParams;

use crate::config::{AccessConfig, BridgeConfig};
use crate::notes::types::{Note, Notebook, TodoList};
use crate::notes::{store, todo};
use crate::sync::{writer, SyncGate};

/// Request-level failures, returned as structured errors to the MCP caller.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: notebook \"{0}\" is not enabled for agent access")]
    AccessDenied(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Reject operations against a notebook the user has not granted.
pub fn ensure_enabled(access: &AccessConfig, notebook: &str) -> Result<(), ToolError> {
    if access.is_enabled(notebook) {
        Ok(())
    } else {
        Err(ToolError::AccessDenied(notebook.to_string()))
    }
}

/// Pick a notebook for a new note: the first known notebook whose name appears
/// (case-insensitively) in the content, else the configured agent notebook.
pub fn infer_notebook(known: &[String], content: &str, agent_notebook: &str) -> String {
    let content = content.to_lowercase();
    known
        .iter()
        .find(|name| content.contains(&name.to_lowercase()))
        .cloned()
        .unwrap_or_else(|| agent_notebook.to_string())
}

/// Bound note content in responses, char-boundary safe.
pub fn truncate_content(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((idx, _)) => format!(
            "{}\n\n[truncated: content exceeds {limit} characters]",
            &content[..idx]
        ),
        None => content.to_string(),
    }
}

/// The notebridge MCP tool handler. Holds shared state (index connection,
/// access config, sync gate, process config) and exposes all tools via the
/// `#[tool_router]` macro.
#[derive(Clone)]
pub struct NotebridgeTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    access: Arc<RwLock<AccessConfig>>,
    gate: Arc<SyncGate>,
    config: Arc<BridgeConfig>,
    sync_root: PathBuf,
}

#[tool_router]
impl NotebridgeTools {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        access: Arc<RwLock<AccessConfig>>,
        gate: Arc<SyncGate>,
        config: Arc<BridgeConfig>,
        sync_root: PathBuf,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            access,
            gate,
            config,
            sync_root,
        }
    }

    fn import_dir(&self) -> PathBuf {
        self.sync_root.join(&self.config.sync.import_dir)
    }

    fn export_dir(&self) -> PathBuf {
        self.sync_root.join(&self.config.sync.export_dir)
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config.sync.settle_delay_ms)
    }

    fn enabled_notebooks(&self) -> Result<Vec<String>, ToolError> {
        let access = self
            .access
            .read()
            .map_err(|e| ToolError::Validation(format!("access config lock poisoned: {e}")))?;
        Ok(access.enabled_notebooks.clone())
    }

    fn with_db<T: Send + 'static>(
        &self,
        f: impl FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
    ) -> impl std::future::Future<Output = Result<T, ToolError>> {
        let db = Arc::clone(&self.db);
        async move {
            tokio::task::spawn_blocking(move || {
                let conn = db
                    .lock()
                    .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
                f(&conn)
            })
            .await
            .map_err(|e| ToolError::Internal(anyhow::anyhow!("db task failed: {e}")))?
            .map_err(ToolError::Internal)
        }
    }

    /// Search the note index by keyword, optionally scoped to one notebook.
    #[tool(description = "Search notes by keyword. Substring match over titles and content, restricted to notebooks the agent has access to. Supports tag filtering and pagination.")]
    async fn search_notes(
        &self,
        Parameters(params): Parameters<SearchNotesParams>,
    ) -> Result<String, String> {
        let result = self.search_notes_inner(params).await;
        result.map_err(|e| e.to_string())
    }

    /// Retrieve the full content of a note by ID.
    #[tool(description = "Retrieve the full content of a specific note by ID.")]
    async fn get_note(
        &self,
        Parameters(params): Parameters<GetNoteParams>,
    ) -> Result<String, String> {
        self.get_note_inner(params).await.map_err(|e| e.to_string())
    }

    /// Create a new note and stage it for import into the note app.
    #[tool(description = "Create a new note. The note is indexed immediately and staged as a Markdown file for the note app to import.")]
    async fn create_note(
        &self,
        Parameters(params): Parameters<CreateNoteParams>,
    ) -> Result<String, String> {
        self.create_note_inner(params)
            .await
            .map_err(|e| e.to_string())
    }

    /// Update an existing note's content, title, or tags.
    #[tool(description = "Update an existing note's content, title, or tags. At least one field must be provided. The updated note is re-staged for import.")]
    async fn update_note(
        &self,
        Parameters(params): Parameters<UpdateNoteParams>,
    ) -> Result<String, String> {
        self.update_note_inner(params)
            .await
            .map_err(|e| e.to_string())
    }

    /// List notebooks and their access status.
    #[tool(description = "List all notebooks with note counts and agent access status.")]
    async fn list_notebooks(
        &self,
        Parameters(params): Parameters<ListNotebooksParams>,
    ) -> Result<String, String> {
        self.list_notebooks_inner(params)
            .await
            .map_err(|e| e.to_string())
    }

    /// Grant or revoke agent access to a notebook.
    #[tool(description = "Grant or revoke agent access to a specific notebook. Persisted to the sync folder's config.")]
    async fn configure_notebook_access(
        &self,
        Parameters(params): Parameters<ConfigureNotebookAccessParams>,
    ) -> Result<String, String> {
        self.configure_notebook_access_inner(params)
            .await
            .map_err(|e| e.to_string())
    }

    /// Read the daily to-do list.
    #[tool(description = "Get the daily to-do list parsed from its note.")]
    async fn get_todo(
        &self,
        Parameters(_params): Parameters<GetTodoParams>,
    ) -> Result<String, String> {
        self.get_todo_inner().await.map_err(|e| e.to_string())
    }

    /// Add, complete, remove, or replace to-do items.
    #[tool(description = "Add, complete, remove, or replace items on the daily to-do list. Creates the to-do note on first use.")]
    async fn update_todo(
        &self,
        Parameters(params): Parameters<UpdateTodoParams>,
    ) -> Result<String, String> {
        self.update_todo_inner(params)
            .await
            .map_err(|e| e.to_string())
    }

    /// Force an immediate sync cycle.
    #[tool(description = "Run a reconciliation cycle against the newest export archive right now, without waiting for the schedule. Returns the sync report.")]
    async fn trigger_sync(
        &self,
        Parameters(_params): Parameters<TriggerSyncParams>,
    ) -> Result<String, String> {
        let report = self.gate.run(&self.db, self.export_dir()).await;
        serde_json::to_string(&report).map_err(|e| e.to_string())
    }
}

impl NotebridgeTools {
    async fn search_notes_inner(&self, params: SearchNotesParams) -> Result<String, ToolError> {
        if params.query.is_empty() {
            return Err(ToolError::Validation("query must not be empty".into()));
        }

        let notebooks = match &params.notebook {
            Some(notebook) => {
                let access = self
                    .access
                    .read()
                    .map_err(|e| ToolError::Validation(format!("access config lock poisoned: {e}")))?;
                ensure_enabled(&access, notebook)?;
                vec![notebook.clone()]
            }
            None => self.enabled_notebooks()?,
        };
        if notebooks.is_empty() {
            return Err(ToolError::Validation(
                "no notebooks enabled; grant access with configure_notebook_access".into(),
            ));
        }

        let limit = params.limit.unwrap_or(20).clamp(1, 100);
        let offset = params.offset.unwrap_or(0);
        let excerpt_chars = self.config.notes.excerpt_chars;
        let query = params.query.clone();

        let mut results = self
            .with_db(move |conn| {
                store::search_notes(conn, &query, &notebooks, limit, offset, excerpt_chars)
            })
            .await?;

        if let Some(tags) = &params.tags {
            if !tags.is_empty() {
                results.retain(|r| tags.iter().all(|t| r.tags.contains(t)));
            }
        }

        tracing::info!(query = %params.query, results = results.len(), "search_notes");
        serde_json::to_string(&serde_json::json!({
            "results": results,
            "count": results.len(),
        }))
        .map_err(|e| ToolError::Internal(e.into()))
    }

    async fn get_note_inner(&self, params: GetNoteParams) -> Result<String, ToolError> {
        let id = params.id.clone();
        let note = self
            .with_db(move |conn| store::get_note_by_id(conn, &id))
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("note {}", params.id)))?;

        {
            let access = self
                .access
                .read()
                .map_err(|e| ToolError::Validation(format!("access config lock poisoned: {e}")))?;
            ensure_enabled(&access, &note.notebook)?;
        }

        let mut note = note;
        note.content = truncate_content(&note.content, self.config.notes.response_char_limit);
        serde_json::to_string(&note).map_err(|e| ToolError::Internal(e.into()))
    }

    async fn create_note_inner(&self, params: CreateNoteParams) -> Result<String, ToolError> {
        if params.title.is_empty() {
            return Err(ToolError::Validation("title must not be empty".into()));
        }

        let notebook = match params.notebook {
            Some(notebook) => notebook,
            None => {
                let known = self
                    .with_db(|conn| store::list_notebooks(conn))
                    .await?
                    .into_iter()
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>();
                infer_notebook(&known, &params.content, &self.config.notes.agent_notebook)
            }
        };

        let now = chrono::Utc::now().to_rfc3339();
        let id = uuid::Uuid::now_v7().to_string();
        let import_dir = self.import_dir();

        let note = Note {
            id: id.clone(),
            title: params.title,
            notebook: notebook.clone(),
            tags: params.tags.unwrap_or_default(),
            content: params.content,
            raw_front_matter: String::new(),
            file_path: import_dir
                .join(&notebook)
                .join(format!("{id}.md"))
                .to_string_lossy()
                .into_owned(),
            created_at: now.clone(),
            updated_at: now,
        };

        let stored = note.clone();
        self.with_db(move |conn| store::upsert_note(conn, &stored))
            .await?;
        writer::write_note_to_staging(&note, &import_dir, self.settle_delay())
            .await
            .map_err(ToolError::Internal)?;

        tracing::info!(id = %note.id, notebook = %note.notebook, "note created");
        serde_json::to_string(&serde_json::json!({
            "id": note.id,
            "title": note.title,
            "notebook": note.notebook,
        }))
        .map_err(|e| ToolError::Internal(e.into()))
    }

    async fn update_note_inner(&self, params: UpdateNoteParams) -> Result<String, ToolError> {
        if params.is_empty() {
            return Err(ToolError::Validation(
                "at least one of content, append, title, or tags must be provided".into(),
            ));
        }

        let id = params.id.clone();
        let note = self
            .with_db(move |conn| store::get_note_by_id(conn, &id))
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("note {}", params.id)))?;

        {
            let access = self
                .access
                .read()
                .map_err(|e| ToolError::Validation(format!("access config lock poisoned: {e}")))?;
            ensure_enabled(&access, &note.notebook)?;
        }

        let content = match (&params.content, &params.append) {
            (Some(content), _) => content.clone(),
            (None, Some(append)) => format!("{}\n{append}", note.content),
            (None, None) => note.content.clone(),
        };

        let updated = Note {
            title: params.title.unwrap_or(note.title),
            tags: params.tags.unwrap_or(note.tags),
            content,
            updated_at: chrono::Utc::now().to_rfc3339(),
            ..note
        };

        let stored = updated.clone();
        self.with_db(move |conn| store::upsert_note(conn, &stored))
            .await?;
        writer::write_note_to_staging(&updated, &self.import_dir(), self.settle_delay())
            .await
            .map_err(ToolError::Internal)?;

        tracing::info!(id = %updated.id, "note updated");
        serde_json::to_string(&serde_json::json!({
            "id": updated.id,
            "title": updated.title,
            "updated_at": updated.updated_at,
        }))
        .map_err(|e| ToolError::Internal(e.into()))
    }

    async fn list_notebooks_inner(&self, params: ListNotebooksParams) -> Result<String, ToolError> {
        let include_disabled = params.include_disabled.unwrap_or(false);
        let counts = self.with_db(|conn| store::list_notebooks(conn)).await?;
        let enabled = self.enabled_notebooks()?;

        let notebooks: Vec<Notebook> = counts
            .into_iter()
            .map(|(name, note_count)| Notebook {
                enabled: enabled.iter().any(|n| n == &name),
                name,
                note_count,
            })
            .filter(|nb| include_disabled || nb.enabled)
            .collect();

        serde_json::to_string(&notebooks).map_err(|e| ToolError::Internal(e.into()))
    }

    async fn configure_notebook_access_inner(
        &self,
        params: ConfigureNotebookAccessParams,
    ) -> Result<String, ToolError> {
        let known = self
            .with_db(|conn| store::list_notebooks(conn))
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        if !known.iter().any(|n| n == &params.notebook) {
            return Err(ToolError::NotFound(format!(
                "notebook \"{}\" (known: {})",
                params.notebook,
                known.join(", ")
            )));
        }

        {
            let mut access = self
                .access
                .write()
                .map_err(|e| ToolError::Validation(format!("access config lock poisoned: {e}")))?;
            access.set_enabled(&params.notebook, params.enabled);
            access.save(&self.sync_root).map_err(ToolError::Internal)?;
        }

        tracing::info!(notebook = %params.notebook, enabled = params.enabled, "notebook access updated");
        serde_json::to_string(&serde_json::json!({
            "notebook": params.notebook,
            "enabled": params.enabled,
        }))
        .map_err(|e| ToolError::Internal(e.into()))
    }

    async fn get_todo_inner(&self) -> Result<String, ToolError> {
        let title = self.config.notes.todo_title.clone();
        let note = self
            .with_db(move |conn| store::get_note_by_title(conn, &title))
            .await?;

        let response = match note {
            Some(note) => {
                let now = chrono::Utc::now().to_rfc3339();
                TodoList {
                    items: todo::parse_items(&note.content, &now),
                    updated_at: note.updated_at,
                }
            }
            None => TodoList {
                items: Vec::new(),
                updated_at: chrono::Utc::now().to_rfc3339(),
            },
        };

        serde_json::to_string(&response).map_err(|e| ToolError::Internal(e.into()))
    }

    async fn update_todo_inner(&self, params: UpdateTodoParams) -> Result<String, ToolError> {
        let update = todo::TodoUpdate {
            add: params.add,
            complete: params.complete,
            remove: params.remove,
            replace_all: params.replace_all,
        };
        if update.is_empty() {
            return Err(ToolError::Validation(
                "at least one of add, complete, remove, or replace_all must be provided".into(),
            ));
        }

        let title = self.config.notes.todo_title.clone();
        let existing = self
            .with_db(move |conn| store::get_note_by_title(conn, &title))
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        let items = match &existing {
            Some(note) => todo::parse_items(&note.content, &now),
            None => Vec::new(),
        };
        let items = todo::apply_update(items, &update, &now);
        let content = todo::serialize_items(&items);

        let import_dir = self.import_dir();
        let note = match existing {
            Some(note) => Note {
                content,
                updated_at: now.clone(),
                ..note
            },
            None => {
                let id = uuid::Uuid::now_v7().to_string();
                let notebook = self.config.notes.agent_notebook.clone();
                Note {
                    file_path: import_dir
                        .join(&notebook)
                        .join(format!("{id}.md"))
                        .to_string_lossy()
                        .into_owned(),
                    id,
                    title: self.config.notes.todo_title.clone(),
                    notebook,
                    tags: Vec::new(),
                    content,
                    raw_front_matter: String::new(),
                    created_at: now.clone(),
                    updated_at: now.clone(),
                }
            }
        };

        let stored = note.clone();
        self.with_db(move |conn| store::upsert_note(conn, &stored))
            .await?;
        writer::write_note_to_staging(&note, &import_dir, self.settle_delay())
            .await
            .map_err(ToolError::Internal)?;

        let pending = items.iter().filter(|i| !i.done).count();
        let done = items.len() - pending;
        tracing::info!(pending, done, "to-do list updated");
        serde_json::to_string(&serde_json::json!({
            "pending": pending,
            "done": done,
            "items": items,
        }))
        .map_err(|e| ToolError::Internal(e.into()))
    }
}

#[tool_handler]
impl ServerHandler for NotebridgeTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "notebridge indexes the note app's Markdown exports. Use search_notes and \
                 get_note to read, create_note/update_note to write (staged for the app to \
                 import), and trigger_sync to pull the newest export immediately."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_enabled_rejects_unknown_notebook() {
        let mut access = AccessConfig::default();
        access.set_enabled("Work", true);

        assert!(ensure_enabled(&access, "Work").is_ok());
        let err = ensure_enabled(&access, "Private").unwrap_err();
        assert!(matches!(err, ToolError::AccessDenied(_)));
        assert!(err.to_string().contains("Private"));
    }

    #[test]
    fn infer_notebook_matches_case_insensitively() {
        let known = vec!["Work".to_string(), "Recipes".to_string()];
        assert_eq!(
            infer_notebook(&known, "notes about RECIPES for dinner", "Agent"),
            "Recipes"
        );
        assert_eq!(infer_notebook(&known, "nothing relevant", "Agent"), "Agent");
        assert_eq!(infer_notebook(&[], "anything", "Agent"), "Agent");
    }

    #[test]
    fn truncate_content_bounds_long_text() {
        let long = "x".repeat(50);
        let truncated = truncate_content(&long, 10);
        assert!(truncated.starts_with("xxxxxxxxxx\n"));
        assert!(truncated.contains("truncated"));
        assert_eq!(truncate_content("short", 10), "short");
    }
}
