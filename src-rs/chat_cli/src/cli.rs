use std::env;

use crate::models::CLIConfig;

const DEFAULT_URL: &str = "http://localhost:8080";

pub fn parse_config() -> CLIConfig {
    let mut cfg = CLIConfig {
        base_url: env_or("SPIRAL_ASSISTANT_URL", DEFAULT_URL.to_string()),
        debug: env_bool("SPIRAL_CHAT_DEBUG", false),
        history_limit: 20,
    };

    let args: Vec<String> = env::args().collect();
    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--base" => {
                if let Some(value) = args.get(idx + 1) {
                    cfg.base_url = value.clone();
                    idx += 1;
                }
            }
            "--history" => {
                if let Some(value) = args.get(idx + 1) {
                    if let Ok(parsed) = value.parse::<usize>() {
                        cfg.history_limit = parsed;
                    }
                    idx += 1;
                }
            }
            "--debug" => cfg.debug = true,
            _ => {}
        }
        idx += 1;
    }

    cfg
}

fn env_or(key: &str, fallback: String) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => fallback,
    }
}

fn env_bool(key: &str, fallback: bool) -> bool {
    match env::var(key) {
        Ok(value) => value.parse::<bool>().unwrap_or(fallback),
        Err(_) => fallback,
    }
}
