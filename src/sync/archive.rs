//! Archive extractor — locates the newest export zip and re-extracts it into
//! a clean scratch directory.
//!
//! Older archives in the export directory are ignored, not deleted, so the
//! user can keep history. Zip entry modification times are restored onto the
//! extracted files: the reconciliation engine compares file mtimes against
//! stored timestamps, and re-extracting an unchanged archive must not make
//! every file look freshly edited.

use anyhow::{Context, Result};
use chrono::TimeZone;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::notes::NOTE_EXTENSION;

/// Scratch subdirectory (under the export dir) archives are extracted into.
pub const SCRATCH_DIR: &str = "extracted";

pub fn scratch_dir(export_dir: &Path) -> PathBuf {
    export_dir.join(SCRATCH_DIR)
}

/// Find the most recently modified `*.zip` in the export directory. A missing
/// directory or an empty one is not an error — there is simply no archive.
pub fn find_latest_archive(export_dir: &Path) -> Result<Option<PathBuf>> {
    if !export_dir.is_dir() {
        return Ok(None);
    }

    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for entry in std::fs::read_dir(export_dir)
        .with_context(|| format!("failed to read {}", export_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("zip") {
            continue;
        }
        let mtime = entry.metadata()?.modified()?;
        if newest.as_ref().is_none_or(|(_, t)| mtime > *t) {
            newest = Some((path, mtime));
        }
    }

    Ok(newest.map(|(path, _)| path))
}

/// Delete and recreate the scratch directory, extract the archive into it,
/// and return the absolute paths of all note files found, sorted.
pub fn extract_archive(zip_path: &Path, export_dir: &Path) -> Result<Vec<PathBuf>> {
    let scratch = scratch_dir(export_dir);
    if scratch.exists() {
        std::fs::remove_dir_all(&scratch)
            .with_context(|| format!("failed to clear {}", scratch.display()))?;
    }
    std::fs::create_dir_all(&scratch)
        .with_context(|| format!("failed to create {}", scratch.display()))?;

    let file = std::fs::File::open(zip_path)
        .with_context(|| format!("failed to open {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read archive {}", zip_path.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // Reject entries escaping the scratch dir (e.g. `../`)
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let target = scratch.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&target)
            .with_context(|| format!("failed to create {}", target.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract {}", target.display()))?;

        if let Some(mtime) = entry.last_modified().and_then(entry_time_to_system) {
            let _ = out.set_modified(mtime);
        }
    }

    let mut notes: Vec<PathBuf> = WalkDir::new(&scratch)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path().extension().and_then(|x| x.to_str()) == Some(NOTE_EXTENSION)
        })
        .map(|e| e.into_path())
        .collect();
    notes.sort();

    Ok(notes)
}

/// Zip stores MS-DOS local times with no zone; treat them as UTC.
fn entry_time_to_system(dt: zip::DateTime) -> Option<SystemTime> {
    chrono::Utc
        .with_ymd_and_hms(
            dt.year() as i32,
            dt.month() as u32,
            dt.day() as u32,
            dt.hour() as u32,
            dt.minute() as u32,
            dt.second() as u32,
        )
        .single()
        .map(SystemTime::from)
}
