use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub raw: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
    pub provider: Option<String>,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(code: &str, message: &str, retryable: bool) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            retryable,
        }
    }

    /// Maps an HTTP failure from a provider to the shared error codes.
    pub fn from_status(status: u16, body: &str) -> Self {
        let lowered = body.to_lowercase();
        if status == 401 || status == 403 {
            return Self::new("auth_error", body, true);
        }
        if status == 429 || lowered.contains("quota") || lowered.contains("resource_exhausted") {
            return Self::new("rate_limit", body, true);
        }
        if status >= 500 {
            return Self::new("server_error", body, true);
        }
        Self::new("api_error", body, false)
    }
}

pub trait ProviderAdapter: Send + Sync {
    fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ProviderError::from_status(401, "").code, "auth_error");
        assert_eq!(ProviderError::from_status(400, "quota exceeded").code, "rate_limit");
        assert_eq!(ProviderError::from_status(503, "").code, "server_error");
        let err = ProviderError::from_status(400, "bad request");
        assert_eq!(err.code, "api_error");
        assert!(!err.retryable);
        assert_eq!(err.to_string(), "api_error: bad request");
    }
}
