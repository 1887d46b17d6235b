use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::warn;

use super::rotation::Rotator;
use super::types::{CompletionRequest, LLMResponse, ProviderAdapter, ProviderError};

pub struct OpenAiConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Chat-completions client.
pub struct OpenAiAdapter {
    cfg: OpenAiConfig,
    rotator: Rotator,
    client: Client,
}

impl OpenAiAdapter {
    pub fn new(mut cfg: OpenAiConfig) -> Result<Self, ProviderError> {
        if cfg.base_url.is_empty() {
            cfg.base_url = "https://api.openai.com".to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = "gpt-4o".to_string();
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| ProviderError::new("client_error", &err.to_string(), false))?;
        Ok(Self {
            rotator: Rotator::new(cfg.api_keys.clone()),
            cfg,
            client,
        })
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
        let payload = json!({
            "model": request.model.clone().unwrap_or_else(|| self.cfg.model.clone()),
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(self.cfg.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.cfg.max_tokens),
        });

        if self.rotator.is_empty() {
            return Err(ProviderError::new("auth_error", "no OpenAI API keys", false));
        }
        let mut last_err = None;
        for _ in 0..self.rotator.len() {
            let key = match self.rotator.next() {
                Some(key) => key,
                None => break,
            };
            match send_request(&self.client, &self.cfg.base_url, &key, &payload) {
                Ok(resp) => return Ok(resp),
                Err(err) if err.retryable => {
                    warn!(code = %err.code, "openai request failed, trying next key");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| ProviderError::new("api_error", "request failed", true)))
    }
}

fn send_request(client: &Client, base_url: &str, api_key: &str, payload: &Value) -> Result<LLMResponse, ProviderError> {
    let endpoint = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
    let resp = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(payload)
        .send()
        .map_err(|err| ProviderError::new("network_error", &err.to_string(), true))?;

    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if status.is_client_error() || status.is_server_error() {
        return Err(ProviderError::from_status(status.as_u16(), &body));
    }

    let raw: Value = serde_json::from_str(&body)
        .map_err(|_| ProviderError::new("parse_error", "invalid json", false))?;
    let content = raw
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::new("parse_error", "response has no message content", false))?;
    Ok(LLMResponse {
        content,
        raw: Some(raw),
    })
}
