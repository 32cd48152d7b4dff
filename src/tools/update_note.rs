//! MCP `update_note` tool parameter definition.
//!
//! At least one of `content`, `append`, `title`, or `tags` must be provided;
//! the handler rejects an empty update.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateNoteParams {
    #[schemars(description = "Note ID to update")]
    pub id: String,

    #[schemars(description = "New note body (replaces existing content)")]
    pub content: Option<String>,

    #[schemars(description = "Text appended to the existing content on a new line")]
    pub append: Option<String>,

    #[schemars(description = "New title")]
    pub title: Option<String>,

    #[schemars(description = "Replacement tag list")]
    pub tags: Option<Vec<String>>,
}

impl UpdateNoteParams {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.append.is_none() && self.title.is_none() && self.tags.is_none()
    }
}
