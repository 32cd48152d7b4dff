pub mod archive;
pub mod engine;
pub mod writer;

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::notes::types::SyncReport;

/// Mutual-exclusion gate over the reconciliation cycle.
///
/// Three independent sources trigger syncs (the periodic schedule, the manual
/// tool, and the export-directory watcher). Cycles must never interleave —
/// they share the scratch directory and the compare-and-upsert step assumes a
/// single writer — so every trigger goes through this gate. Manual triggers
/// wait; background triggers coalesce by dropping when a cycle is in flight.
pub struct SyncGate {
    lock: tokio::sync::Mutex<()>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self {
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run a cycle, waiting for any in-flight cycle to finish first.
    pub async fn run(&self, db: &Arc<Mutex<Connection>>, export_dir: PathBuf) -> SyncReport {
        let _guard = self.lock.lock().await;
        run_blocking(Arc::clone(db), export_dir).await
    }

    /// Run a cycle unless one is already in flight, in which case the trigger
    /// is dropped and `None` returned.
    pub async fn try_run(
        &self,
        db: &Arc<Mutex<Connection>>,
        export_dir: PathBuf,
    ) -> Option<SyncReport> {
        let Ok(_guard) = self.lock.try_lock() else {
            tracing::debug!("sync already in flight, trigger dropped");
            return None;
        };
        Some(run_blocking(Arc::clone(db), export_dir).await)
    }
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

/// The engine does blocking filesystem and SQLite work, so it runs on the
/// blocking pool. Failures outside the engine (poisoned lock, cancelled task)
/// are folded into the report rather than propagated.
async fn run_blocking(db: Arc<Mutex<Connection>>, export_dir: PathBuf) -> SyncReport {
    let result = tokio::task::spawn_blocking(move || match db.lock() {
        Ok(conn) => engine::run_sync(&conn, &export_dir),
        Err(e) => {
            let mut report = SyncReport::new();
            report.errors.push(format!("index lock poisoned: {e}"));
            report
        }
    })
    .await;

    result.unwrap_or_else(|e| {
        let mut report = SyncReport::new();
        report.errors.push(format!("sync task failed: {e}"));
        report
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[tokio::test]
    async fn try_run_drops_when_gate_is_held() {
        let gate = SyncGate::new();
        let db = Arc::new(Mutex::new(open_memory_database().unwrap()));
        let dir = tempfile::tempdir().unwrap();

        let _held = gate.lock.lock().await;
        let result = gate.try_run(&db, dir.path().to_path_buf()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn run_waits_and_completes() {
        let gate = SyncGate::new();
        let db = Arc::new(Mutex::new(open_memory_database().unwrap()));
        let dir = tempfile::tempdir().unwrap();

        let report = gate.run(&db, dir.path().to_path_buf()).await;
        // Empty export dir: archive-level failure, still a report
        assert_eq!(report.notes_read, 0);
        assert!(!report.errors.is_empty());
    }
}
