use std::env;
use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::generator::LlmSnippetGenerator;
use crate::llm::{GeminiAdapter, GeminiConfig, LLMRouter, OpenAiAdapter, OpenAiConfig};

fn load_keys_from_env(primary: &str, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Ok(raw) = env::var(primary) {
        keys.extend(split_keys(&raw));
    }
    for idx in 2..=10 {
        let key = format!("{}_{}", prefix, idx);
        if let Ok(value) = env::var(&key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    keys
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_openai_keys() -> Vec<String> {
    load_keys_from_env("OPENAI_API_KEY", "OPENAI_API_KEY")
}

pub fn load_gemini_keys() -> Vec<String> {
    load_keys_from_env("GEMINI_API_KEY", "GEMINI_API_KEY")
}

pub fn build_llm_router(cfg: &AssistantConfig) -> Result<LLMRouter, String> {
    let mut router = LLMRouter::new(&cfg.provider);

    let openai_keys = load_openai_keys();
    if !openai_keys.is_empty() {
        let model = if cfg.provider == "openai" {
            cfg.model.clone()
        } else {
            "gpt-4o".to_string()
        };
        let adapter = OpenAiAdapter::new(OpenAiConfig {
            api_keys: openai_keys,
            base_url: env::var("OPENAI_BASE_URL").unwrap_or_default(),
            model,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
        .map_err(|err| err.to_string())?;
        router.register_provider("openai", Arc::new(adapter));
    } else if cfg.provider == "openai" {
        return Err("openai provider selected but no OPENAI_API_KEY found".to_string());
    }

    let gemini_keys = load_gemini_keys();
    if !gemini_keys.is_empty() {
        let model = if cfg.provider == "gemini" {
            cfg.model.clone()
        } else {
            "gemini-3-flash-preview".to_string()
        };
        let adapter = GeminiAdapter::new(GeminiConfig {
            api_keys: gemini_keys,
            base_url: String::new(),
            model,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
        .map_err(|err| err.to_string())?;
        router.register_provider("gemini", Arc::new(adapter));
    } else if cfg.provider == "gemini" {
        return Err("gemini provider selected but no GEMINI_API_KEY found".to_string());
    }

    if !router.has_provider(&cfg.provider) {
        return Err(format!("unknown provider: {}", cfg.provider));
    }
    Ok(router)
}

pub fn build_generator(cfg: &AssistantConfig) -> Result<LlmSnippetGenerator, String> {
    let router = build_llm_router(cfg)?;
    Ok(LlmSnippetGenerator::new(
        router,
        Some(cfg.model.clone()),
        cfg.temperature,
        cfg.max_tokens,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_keys_are_split() {
        assert_eq!(split_keys(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_keys("").is_empty());
    }
}
