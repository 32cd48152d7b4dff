//! To-do workflow over a live index: create the list note on first use, then
//! mutate it through the checklist convention.

mod helpers;

use notebridge::notes::store;
use notebridge::notes::todo::{apply_update, parse_items, serialize_items, TodoUpdate};
use notebridge::notes::types::Note;

const TODO_TITLE: &str = "Daily To-Do List";
const NOW: &str = "2024-06-01T00:00:00+00:00";

fn upsert_todo(conn: &rusqlite::Connection, content: String) -> Note {
    let note = Note {
        id: "todo-1".to_string(),
        title: TODO_TITLE.to_string(),
        notebook: "Agent".to_string(),
        tags: Vec::new(),
        content,
        raw_front_matter: String::new(),
        file_path: String::new(),
        created_at: NOW.to_string(),
        updated_at: NOW.to_string(),
    };
    store::upsert_note(conn, &note).unwrap();
    note
}

#[test]
fn first_update_creates_the_list_from_nothing() {
    let conn = helpers::test_db();
    assert!(store::get_note_by_title(&conn, TODO_TITLE).unwrap().is_none());

    let update = TodoUpdate {
        add: Some(vec!["review release notes".into()]),
        ..Default::default()
    };
    let items = apply_update(Vec::new(), &update, NOW);
    upsert_todo(&conn, serialize_items(&items));

    let stored = store::get_note_by_title(&conn, TODO_TITLE).unwrap().unwrap();
    let items = parse_items(&stored.content, NOW);
    assert_eq!(items.len(), 1);
    assert!(!items[0].done);
    assert_eq!(items[0].text, "review release notes");
}

#[test]
fn completing_by_substring_persists_through_the_index() {
    let conn = helpers::test_db();
    upsert_todo(&conn, "- [ ] buy milk\n- [ ] walk dog".to_string());

    let stored = store::get_note_by_title(&conn, TODO_TITLE).unwrap().unwrap();
    let update = TodoUpdate {
        complete: Some(vec!["milk".into()]),
        ..Default::default()
    };
    let items = apply_update(parse_items(&stored.content, NOW), &update, NOW);
    upsert_todo(&conn, serialize_items(&items));

    let reloaded = store::get_note_by_title(&conn, TODO_TITLE).unwrap().unwrap();
    assert_eq!(reloaded.content, "- [x] buy milk\n- [ ] walk dog");
}

#[test]
fn title_lookup_is_case_insensitive() {
    let conn = helpers::test_db();
    upsert_todo(&conn, "- [ ] anything".to_string());

    assert!(store::get_note_by_title(&conn, "daily to-do list")
        .unwrap()
        .is_some());
}
