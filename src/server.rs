//! MCP server initialization for stdio and HTTP transports.
//!
//! Wires the index database, access config, and sync gate into the tool
//! handler, and spawns the three background sync triggers: a startup-plus-
//! interval schedule and a filesystem watcher on the export directory. All
//! triggers funnel through the shared [`SyncGate`]; a trigger firing while a
//! cycle is in flight is dropped, never interleaved.

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rmcp::ServiceExt;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::config::{AccessConfig, BridgeConfig};
use crate::db;
use crate::sync::SyncGate;
use crate::tools::NotebridgeTools;

struct SharedState {
    db: Arc<Mutex<Connection>>,
    access: Arc<RwLock<AccessConfig>>,
    gate: Arc<SyncGate>,
    config: Arc<BridgeConfig>,
    sync_root: PathBuf,
}

/// Shared setup: resolve the sync root (fatal when missing), open the index,
/// load the access config, and create the export/import directories.
fn setup_shared_state(config: BridgeConfig) -> Result<SharedState> {
    let sync_root = config.resolved_sync_root()?;
    let db_path = config.resolved_db_path()?;

    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let access = AccessConfig::load(&sync_root)?;
    if !access.first_run_complete {
        tracing::warn!("first-run setup has not been completed — run `notebridge setup`");
    }

    std::fs::create_dir_all(sync_root.join(&config.sync.export_dir))
        .context("failed to create export directory")?;
    std::fs::create_dir_all(sync_root.join(&config.sync.import_dir))
        .context("failed to create import directory")?;

    Ok(SharedState {
        db: Arc::new(Mutex::new(conn)),
        access: Arc::new(RwLock::new(access)),
        gate: Arc::new(SyncGate::new()),
        config: Arc::new(config),
        sync_root,
    })
}

impl SharedState {
    fn export_dir(&self) -> PathBuf {
        self.sync_root.join(&self.config.sync.export_dir)
    }

    fn tools(&self) -> NotebridgeTools {
        NotebridgeTools::new(
            Arc::clone(&self.db),
            Arc::clone(&self.access),
            Arc::clone(&self.gate),
            Arc::clone(&self.config),
            self.sync_root.clone(),
        )
    }
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: BridgeConfig) -> Result<()> {
    tracing::info!("starting notebridge MCP server on stdio");

    let state = setup_shared_state(config)?;
    spawn_background_triggers(&state);

    let tools = state.tools();
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP.
pub async fn serve_http(config: BridgeConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting notebridge MCP server on HTTP");

    let state = setup_shared_state(config)?;
    spawn_background_triggers(&state);

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(state.tools()),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

/// Spawn the schedule task (first tick fires immediately, covering the
/// startup sync) and the export-directory watcher. Both log failures and keep
/// running — a bad cycle never stops future cycles.
fn spawn_background_triggers(state: &SharedState) {
    let export_dir = state.export_dir();

    {
        let db = Arc::clone(&state.db);
        let gate = Arc::clone(&state.gate);
        let export_dir = export_dir.clone();
        let minutes = state.config.sync.interval_minutes;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Some(report) = gate.try_run(&db, export_dir.clone()).await {
                    tracing::info!(
                        written = report.notes_written,
                        conflicts = report.conflicts,
                        errors = report.errors.len(),
                        "scheduled sync complete"
                    );
                }
            }
        });
    }

    {
        let db = Arc::clone(&state.db);
        let gate = Arc::clone(&state.gate);
        tokio::spawn(async move {
            if let Err(e) = watch_export_dir(db, gate, export_dir).await {
                tracing::error!(error = %format!("{e:#}"), "export watcher stopped");
            }
        });
    }
}

/// Watch the export directory and trigger a sync whenever an archive appears
/// or changes.
async fn watch_export_dir(
    db: Arc<Mutex<Connection>>,
    gate: Arc<SyncGate>,
    export_dir: PathBuf,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);

    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<notify::Event>| {
            let _ = tx.blocking_send(result);
        },
        notify::Config::default(),
    )
    .context("failed to create export watcher")?;

    watcher
        .watch(&export_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", export_dir.display()))?;
    tracing::info!(dir = %export_dir.display(), "watching export directory");

    while let Some(result) = rx.recv().await {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "watch event error");
                continue;
            }
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            continue;
        }
        if !event.paths.iter().any(is_archive) {
            continue;
        }

        tracing::info!("new export archive detected, syncing");
        if let Some(report) = gate.try_run(&db, export_dir.clone()).await {
            tracing::info!(
                written = report.notes_written,
                conflicts = report.conflicts,
                errors = report.errors.len(),
                "watcher-triggered sync complete"
            );
        }
    }

    Ok(())
}

fn is_archive(path: impl AsRef<Path>) -> bool {
    path.as_ref().extension().and_then(|e| e.to_str()) == Some("zip")
}
