use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical outcome of one executed snippet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Success {
        data: Value,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    WaitingInput {
        message: String,
        required_params: Vec<String>,
    },
}

impl ExecutionResult {
    pub fn success(data: Value) -> Self {
        ExecutionResult::Success { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ExecutionResult::Error {
            message: message.into(),
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionResult::Error { .. })
    }
}
