//! MCP `search_notes` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_notes` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchNotesParams {
    #[schemars(description = "Search terms matched as a substring of note titles and content")]
    pub query: String,

    #[schemars(description = "Restrict to a single notebook (must be enabled for agent access)")]
    pub notebook: Option<String>,

    #[schemars(description = "Filter results to notes carrying all of these tags")]
    pub tags: Option<Vec<String>>,

    #[schemars(description = "Maximum results to return (1-100). Defaults to 20.")]
    pub limit: Option<usize>,

    #[schemars(description = "Number of results to skip, for pagination. Defaults to 0.")]
    pub offset: Option<usize>,
}
