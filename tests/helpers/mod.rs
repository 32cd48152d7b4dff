#![allow(dead_code)]

use notebridge::db;
use rusqlite::Connection;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Open a fresh in-memory index with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// A fixed zip entry timestamp, so extracted file mtimes are deterministic.
pub fn entry_time() -> zip::DateTime {
    zip::DateTime::from_date_and_time(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Build a zip archive at `path` from `(entry_name, contents)` pairs, all
/// stamped with [`entry_time`]. Entry names use `/` separators.
pub fn build_archive(path: &Path, entries: &[(&str, &str)]) {
    let byte_entries: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(name, content)| (*name, content.as_bytes()))
        .collect();
    build_archive_bytes(path, &byte_entries);
}

/// Same as [`build_archive`] but with raw byte contents, for producing
/// deliberately unreadable entries.
pub fn build_archive_bytes(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().last_modified_time(entry_time());
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

/// Push a file's mtime into the past by `secs` seconds.
pub fn age_file(path: &Path, secs: u64) {
    let past = std::time::SystemTime::now() - std::time::Duration::from_secs(secs);
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(past)
        .unwrap();
}
