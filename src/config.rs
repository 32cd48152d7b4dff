use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Filename of the persisted notebook-access config inside the sync root.
pub const ACCESS_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub notes: NotesConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Absolute path to the shared sync folder. Required — the server refuses
    /// to start without it.
    pub sync_root: String,
    pub db_file: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_minutes: u64,
    /// Post-write settle delay so the external app's watcher sees the file
    /// before a follow-up operation runs.
    pub settle_delay_ms: u64,
    pub export_dir: String,
    pub import_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotesConfig {
    /// Notebook that agent-created notes land in when none can be inferred.
    pub agent_notebook: String,
    /// Title of the singleton to-do note.
    pub todo_title: String,
    pub excerpt_chars: usize,
    pub response_char_limit: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
            notes: NotesConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 3457,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sync_root: String::new(),
            db_file: "notebridge.db".into(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            settle_delay_ms: 2000,
            export_dir: "export".into(),
            import_dir: "import".into(),
        }
    }
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            agent_notebook: "Agent".into(),
            todo_title: "Daily To-Do List".into(),
            excerpt_chars: 200,
            response_char_limit: 8000,
        }
    }
}

/// Returns `~/.notebridge/`
pub fn default_notebridge_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".notebridge")
}

/// Returns the default config file path: `~/.notebridge/config.toml`
pub fn default_config_path() -> PathBuf {
    default_notebridge_dir().join("config.toml")
}

impl BridgeConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            BridgeConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (NOTEBRIDGE_SYNC_ROOT,
    /// NOTEBRIDGE_DB, NOTEBRIDGE_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NOTEBRIDGE_SYNC_ROOT") {
            self.storage.sync_root = val;
        }
        if let Ok(val) = std::env::var("NOTEBRIDGE_DB") {
            self.storage.db_file = val;
        }
        if let Ok(val) = std::env::var("NOTEBRIDGE_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the sync root, expanding `~`. Fails when no root is configured —
    /// the server must not start without one.
    pub fn resolved_sync_root(&self) -> Result<PathBuf> {
        if self.storage.sync_root.is_empty() {
            bail!(
                "no sync root configured — set storage.sync_root in {} or the \
                 NOTEBRIDGE_SYNC_ROOT env var",
                default_config_path().display()
            );
        }
        Ok(expand_tilde(&self.storage.sync_root))
    }

    /// Database path: `<sync_root>/<db_file>`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        Ok(self.resolved_sync_root()?.join(&self.storage.db_file))
    }

    /// Directory the note app drops export archives into.
    pub fn export_dir(&self) -> Result<PathBuf> {
        Ok(self.resolved_sync_root()?.join(&self.sync.export_dir))
    }

    /// Staging directory the note app watches for re-import.
    pub fn import_dir(&self) -> Result<PathBuf> {
        Ok(self.resolved_sync_root()?.join(&self.sync.import_dir))
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// The per-sync-root access config, persisted as JSON at
/// `<sync_root>/config.json`. Holds the notebook grants the user made during
/// setup plus the first-run flag. Saved synchronously on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    pub enabled_notebooks: Vec<String>,
    pub first_run_complete: bool,
    pub last_sync_at: Option<String>,
}

impl AccessConfig {
    /// Load the access config from `<sync_root>/config.json`. A missing file
    /// yields the default (nothing enabled, first run pending).
    pub fn load(sync_root: &Path) -> Result<Self> {
        let path = sync_root.join(ACCESS_CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Persist to `<sync_root>/config.json`.
    pub fn save(&self, sync_root: &Path) -> Result<()> {
        let path = sync_root.join(ACCESS_CONFIG_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn is_enabled(&self, notebook: &str) -> bool {
        self.enabled_notebooks.iter().any(|n| n == notebook)
    }

    /// Grant or revoke access to a notebook. Returns true if the set changed.
    pub fn set_enabled(&mut self, notebook: &str, enabled: bool) -> bool {
        if enabled {
            if self.is_enabled(notebook) {
                false
            } else {
                self.enabled_notebooks.push(notebook.to_string());
                true
            }
        } else {
            let before = self.enabled_notebooks.len();
            self.enabled_notebooks.retain(|n| n != notebook);
            self.enabled_notebooks.len() != before
        }
    }
}
