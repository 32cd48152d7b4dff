//! Checklist convention layered on the to-do note's content.
//!
//! `- [ ] text` is pending, `- [x]` / `- [X]` is done, and a bare `- text`
//! bullet counts as pending. Items are a view over the note body — nothing
//! here touches the index.

use crate::notes::types::TodoItem;

/// Parse checklist items out of note content. Non-list lines are ignored.
pub fn parse_items(content: &str, now: &str) -> Vec<TodoItem> {
    let mut items = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(text) = trimmed
            .strip_prefix("- [x] ")
            .or_else(|| trimmed.strip_prefix("- [X] "))
        {
            items.push(TodoItem {
                text: text.to_string(),
                done: true,
                added_at: now.to_string(),
            });
        } else if let Some(text) = trimmed.strip_prefix("- [ ] ") {
            items.push(TodoItem {
                text: text.to_string(),
                done: false,
                added_at: now.to_string(),
            });
        } else if let Some(text) = trimmed.strip_prefix("- ") {
            if !text.is_empty() {
                items.push(TodoItem {
                    text: text.to_string(),
                    done: false,
                    added_at: now.to_string(),
                });
            }
        }
    }
    items
}

/// Serialize items back to checklist lines. Bare bullets normalize to `- [ ]`.
pub fn serialize_items(items: &[TodoItem]) -> String {
    items
        .iter()
        .map(|item| {
            if item.done {
                format!("- [x] {}", item.text)
            } else {
                format!("- [ ] {}", item.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A batch of list mutations. `replace_all` wins over the others.
#[derive(Debug, Default)]
pub struct TodoUpdate {
    pub add: Option<Vec<String>>,
    pub complete: Option<Vec<String>>,
    pub remove: Option<Vec<String>>,
    pub replace_all: Option<Vec<String>>,
}

impl TodoUpdate {
    pub fn is_empty(&self) -> bool {
        self.add.is_none()
            && self.complete.is_none()
            && self.remove.is_none()
            && self.replace_all.is_none()
    }
}

/// Apply an update to the current items. `complete` and `remove` match by
/// case-insensitive substring against each item's text.
pub fn apply_update(mut items: Vec<TodoItem>, update: &TodoUpdate, now: &str) -> Vec<TodoItem> {
    if let Some(replacement) = &update.replace_all {
        return replacement
            .iter()
            .map(|text| TodoItem {
                text: text.clone(),
                done: false,
                added_at: now.to_string(),
            })
            .collect();
    }

    if let Some(add) = &update.add {
        for text in add {
            items.push(TodoItem {
                text: text.clone(),
                done: false,
                added_at: now.to_string(),
            });
        }
    }
    if let Some(complete) = &update.complete {
        for snippet in complete {
            let snippet = snippet.to_lowercase();
            for item in &mut items {
                if item.text.to_lowercase().contains(&snippet) {
                    item.done = true;
                }
            }
        }
    }
    if let Some(remove) = &update.remove {
        for snippet in remove {
            let snippet = snippet.to_lowercase();
            items.retain(|item| !item.text.to_lowercase().contains(&snippet));
        }
    }

    items
}
