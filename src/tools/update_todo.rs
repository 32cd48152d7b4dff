//! MCP `update_todo` tool parameter definition.
//!
//! At least one operation must be provided; `replace_all` wins over the rest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTodoParams {
    #[schemars(description = "Items to add to the to-do list")]
    pub add: Option<Vec<String>>,

    #[schemars(
        description = "Item text snippets to mark as done (case-insensitive partial match)"
    )]
    pub complete: Option<Vec<String>>,

    #[schemars(
        description = "Item text snippets to remove entirely (case-insensitive partial match)"
    )]
    pub remove: Option<Vec<String>>,

    #[schemars(description = "Replace the entire list with these items")]
    pub replace_all: Option<Vec<String>>,
}
