use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateNoteParams {
    #[schemars(description = "Note title")]
    pub title: String,

    #[schemars(description = "Note body in Markdown")]
    pub content: String,

    #[schemars(
        description = "Notebook to create in. If omitted, inferred from the content or defaulted to the agent notebook."
    )]
    pub notebook: Option<String>,

    #[schemars(description = "Tags to apply")]
    pub tags: Option<Vec<String>>,
}
