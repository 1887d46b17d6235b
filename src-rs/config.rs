use std::env;
use std::fmt;

pub const DEFAULT_ENDPOINT: &str = "https://api.spiral-platform.com/v1";
pub const DEFAULT_LOG_BODY_LIMIT: usize = 500;

/// Target API location and credentials. Fixed for the lifetime of one executor.
#[derive(Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: String,
}

impl EndpointConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, "")
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "<unset>" })
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub endpoint: EndpointConfig,
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub log_body_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            log_body_limit: DEFAULT_LOG_BODY_LIMIT,
        }
    }
}

impl AssistantConfig {
    /// Defaults overridden by `SPIRAL_*` environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(url) = env_opt("SPIRAL_API_ENDPOINT") {
            cfg.endpoint.base_url = url;
        }
        if let Some(key) = env_opt("SPIRAL_API_KEY") {
            cfg.endpoint.api_key = key;
        }
        if let Some(provider) = env_opt("SPIRAL_ASSISTANT_PROVIDER") {
            cfg.provider = provider;
            if cfg.provider == "gemini" {
                cfg.model = "gemini-3-flash-preview".to_string();
            }
        }
        if let Some(model) = env_opt("SPIRAL_ASSISTANT_MODEL") {
            cfg.model = model;
        }
        if let Some(temp) = env_opt("SPIRAL_ASSISTANT_TEMPERATURE").and_then(|raw| raw.parse::<f64>().ok()) {
            cfg.temperature = temp;
        }
        if let Some(limit) = env_opt("SPIRAL_LOG_BODY_LIMIT").and_then(|raw| raw.parse::<usize>().ok()) {
            cfg.log_body_limit = limit;
        }
        cfg
    }
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}
