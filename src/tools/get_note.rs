use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetNoteParams {
    #[schemars(description = "Note ID from search results")]
    pub id: String,
}
