//! Reconciliation engine — the per-cycle state machine.
//!
//! One cycle: locate the newest archive, extract it, materialize each note
//! file, and reconcile it against the index. Per-file failures are recorded
//! and skipped; archive-level failures short-circuit the loop. Either way the
//! cycle completes with a [`SyncReport`] and a recorded completion timestamp —
//! it never surfaces an error to the trigger.
//!
//! Conflict policy: last write wins by the extracted file's filesystem mtime.
//! An incoming file strictly newer than the stored `updated_at` replaces the
//! record and ticks the conflict counter; anything else is skipped silently,
//! which keeps re-syncing an unchanged export a no-op.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;

use crate::notes::materialize::note_from_file;
use crate::notes::store;
use crate::notes::types::SyncReport;
use crate::sync::archive::{extract_archive, find_latest_archive, scratch_dir};

/// Run one full reconciliation cycle against the given export directory.
pub fn run_sync(conn: &Connection, export_dir: &Path) -> SyncReport {
    let mut report = SyncReport::new();
    tracing::info!(export_dir = %export_dir.display(), "sync cycle starting");

    let archive = match find_latest_archive(export_dir) {
        Ok(Some(path)) => path,
        Ok(None) => {
            report
                .errors
                .push(format!("no export archive found in {}", export_dir.display()));
            return finish(conn, report);
        }
        Err(e) => {
            report
                .errors
                .push(format!("failed to scan {}: {e:#}", export_dir.display()));
            return finish(conn, report);
        }
    };

    let files = match extract_archive(&archive, export_dir) {
        Ok(files) => files,
        Err(e) => {
            report
                .errors
                .push(format!("failed to extract {}: {e:#}", archive.display()));
            return finish(conn, report);
        }
    };

    let root = scratch_dir(export_dir);
    for file in files {
        report.notes_read += 1;
        if let Err(e) = reconcile_file(conn, &file, &root, &mut report) {
            report
                .errors
                .push(format!("error processing {}: {e:#}", file.display()));
        }
    }

    finish(conn, report)
}

/// Materialize one file and apply the compare-and-upsert step. Any error here
/// leaves the index untouched for this note.
fn reconcile_file(
    conn: &Connection,
    path: &Path,
    root: &Path,
    report: &mut SyncReport,
) -> Result<()> {
    let candidate = note_from_file(path, root)?;

    match store::get_note_by_id(conn, &candidate.id)? {
        None => {
            store::upsert_note(conn, &candidate)?;
            report.notes_written += 1;
        }
        Some(existing) => {
            let file_mtime: DateTime<Utc> = std::fs::metadata(path)?.modified()?.into();
            let stored_mtime = DateTime::parse_from_rfc3339(&existing.updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .ok();

            // Unparsable stored timestamp: never "strictly newer", skip.
            if stored_mtime.is_some_and(|stored| file_mtime > stored) {
                store::upsert_note(conn, &candidate)?;
                report.notes_written += 1;
                report.conflicts += 1;
                tracing::debug!(id = %candidate.id, "overwrote existing entry (file newer)");
            }
        }
    }

    Ok(())
}

/// Stamp the completion time and persist it. The cycle completes even when the
/// timestamp write itself fails; that failure joins the error list.
fn finish(conn: &Connection, mut report: SyncReport) -> SyncReport {
    report.synced_at = Utc::now().to_rfc3339();
    if let Err(e) = store::set_last_sync(conn, &report.synced_at) {
        report
            .errors
            .push(format!("failed to record sync timestamp: {e:#}"));
    }

    tracing::info!(
        read = report.notes_read,
        written = report.notes_written,
        conflicts = report.conflicts,
        errors = report.errors.len(),
        "sync cycle complete"
    );
    for error in &report.errors {
        tracing::warn!(%error, "sync error");
    }

    report
}
