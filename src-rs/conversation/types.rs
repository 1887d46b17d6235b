use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::ExecutionResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
    /// Awaiting the user's execute confirmation.
    #[serde(default)]
    pub ready: bool,
    pub created_at: DateTime<Utc>,
}
