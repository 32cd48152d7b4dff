use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListNotebooksParams {
    #[schemars(description = "Include notebooks not enabled for agent access. Defaults to false.")]
    pub include_disabled: Option<bool>,
}
