use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConfigureNotebookAccessParams {
    #[schemars(description = "Notebook name to configure")]
    pub notebook: String,

    #[schemars(description = "True to grant agent access, false to revoke")]
    pub enabled: bool,
}
