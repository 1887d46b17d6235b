use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub debug: bool,
    pub history_limit: usize,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ConfigRequest {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigResponse {
    pub endpoint: String,
    pub has_api_key: bool,
}

#[derive(Debug, Deserialize)]
pub struct TurnView {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub ready: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionReply {
    pub turns: Vec<TurnView>,
    pub state: Value,
    pub pending_param: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryReply {
    pub turns: Vec<TurnView>,
    pub state: Value,
}
