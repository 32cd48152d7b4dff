//! End-to-end reconciliation tests: a real export directory with a real zip
//! archive, driven through the engine against an in-memory index.

mod helpers;

use notebridge::notes::materialize::generate_id;
use notebridge::notes::store;
use notebridge::sync::engine::run_sync;

const WORK_NOTE: &str = "---\ntitle: Ship it\ntags: [urgent, q3]\n---\n\n# Ship it\n\nFinish the release checklist.\n";
const ROOT_NOTE: &str = "Just a loose thought, no front matter.\n";

#[test]
fn first_sync_indexes_every_note() {
    let conn = helpers::test_db();
    let export = tempfile::tempdir().unwrap();
    helpers::build_archive(
        &export.path().join("notes-export.zip"),
        &[("work/todo.md", WORK_NOTE), ("scratch.md", ROOT_NOTE)],
    );

    let report = run_sync(&conn, export.path());

    assert_eq!(report.notes_read, 2);
    assert_eq!(report.notes_written, 2);
    assert_eq!(report.conflicts, 0);
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    let note = store::get_note_by_id(&conn, &generate_id("work/todo.md"))
        .unwrap()
        .unwrap();
    assert_eq!(note.title, "Ship it");
    assert_eq!(note.notebook, "work");
    assert_eq!(note.tags, vec!["urgent", "q3"]);
    assert!(note.content.contains("release checklist"));
    assert!(note.raw_front_matter.starts_with("---\n"));

    let loose = store::get_note_by_id(&conn, &generate_id("scratch.md"))
        .unwrap()
        .unwrap();
    assert_eq!(loose.notebook, "Default");
    assert_eq!(loose.title, "scratch");
}

#[test]
fn resyncing_an_unchanged_export_is_a_no_op() {
    let conn = helpers::test_db();
    let export = tempfile::tempdir().unwrap();
    helpers::build_archive(
        &export.path().join("notes-export.zip"),
        &[("work/todo.md", WORK_NOTE), ("scratch.md", ROOT_NOTE)],
    );

    run_sync(&conn, export.path());
    let second = run_sync(&conn, export.path());

    assert_eq!(second.notes_read, 2);
    assert_eq!(second.notes_written, 0);
    assert_eq!(second.conflicts, 0);
    assert!(second.errors.is_empty(), "{:?}", second.errors);
}

#[test]
fn newer_file_overwrites_stale_entry_and_counts_conflict() {
    let conn = helpers::test_db();
    let export = tempfile::tempdir().unwrap();
    helpers::build_archive(
        &export.path().join("notes-export.zip"),
        &[("work/todo.md", WORK_NOTE)],
    );
    run_sync(&conn, export.path());

    // Backdate the stored record, as if an agent edit landed long before the
    // export was produced.
    let mut stale = store::get_note_by_id(&conn, &generate_id("work/todo.md"))
        .unwrap()
        .unwrap();
    stale.content = "agent-side edit".to_string();
    stale.updated_at = "2020-01-01T00:00:00+00:00".to_string();
    store::upsert_note(&conn, &stale).unwrap();

    let report = run_sync(&conn, export.path());

    assert_eq!(report.notes_written, 1);
    assert_eq!(report.conflicts, 1);
    let restored = store::get_note_by_id(&conn, &stale.id).unwrap().unwrap();
    assert!(restored.content.contains("release checklist"));
}

#[test]
fn file_not_strictly_newer_leaves_entry_untouched() {
    let conn = helpers::test_db();
    let export = tempfile::tempdir().unwrap();
    helpers::build_archive(
        &export.path().join("notes-export.zip"),
        &[("work/todo.md", WORK_NOTE)],
    );
    run_sync(&conn, export.path());

    let mut fresh = store::get_note_by_id(&conn, &generate_id("work/todo.md"))
        .unwrap()
        .unwrap();
    fresh.content = "agent-side edit".to_string();
    fresh.updated_at = "2030-01-01T00:00:00+00:00".to_string();
    store::upsert_note(&conn, &fresh).unwrap();

    let report = run_sync(&conn, export.path());

    assert_eq!(report.notes_written, 0);
    assert_eq!(report.conflicts, 0);
    let kept = store::get_note_by_id(&conn, &fresh.id).unwrap().unwrap();
    assert_eq!(kept.content, "agent-side edit");
}

#[test]
fn unreadable_file_is_reported_and_skipped() {
    let conn = helpers::test_db();
    let export = tempfile::tempdir().unwrap();
    helpers::build_archive_bytes(
        &export.path().join("notes-export.zip"),
        &[
            ("bad.md", &[0xff, 0xfe, 0x00, 0x41][..]),
            ("good.md", ROOT_NOTE.as_bytes()),
        ],
    );

    let report = run_sync(&conn, export.path());

    assert_eq!(report.notes_read, 2);
    assert_eq!(report.notes_written, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("bad.md"), "{}", report.errors[0]);
    assert!(store::get_note_by_id(&conn, &generate_id("good.md"))
        .unwrap()
        .is_some());
}

#[test]
fn corrupt_archive_yields_error_report_with_timestamp() {
    let conn = helpers::test_db();
    let export = tempfile::tempdir().unwrap();
    std::fs::write(export.path().join("broken.zip"), b"not a zip at all").unwrap();

    let report = run_sync(&conn, export.path());

    assert_eq!(report.notes_read, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("failed to extract"));
    assert_eq!(
        store::get_last_sync(&conn).unwrap().as_deref(),
        Some(report.synced_at.as_str())
    );
}

#[test]
fn newest_archive_by_mtime_wins() {
    let conn = helpers::test_db();
    let export = tempfile::tempdir().unwrap();

    let old = export.path().join("old.zip");
    helpers::build_archive(&old, &[("note.md", "old body\n")]);
    helpers::age_file(&old, 3600);
    helpers::build_archive(&export.path().join("new.zip"), &[("note.md", "new body\n")]);

    let report = run_sync(&conn, export.path());

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    let note = store::get_note_by_id(&conn, &generate_id("note.md"))
        .unwrap()
        .unwrap();
    assert_eq!(note.content.trim_end(), "new body");
}
