use std::io::{self, Write};

use serde_json::Value;

use crate::models::{CLIConfig, ConfigResponse, TurnView};

pub fn banner(cfg: &CLIConfig) {
    println!("SPIRAL API アシスタント");
    println!("Server: {}", cfg.base_url);
    println!("Type /help for commands.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /help                 Show commands");
    println!("  /exit | /quit         Exit");
    println!("  /exec                 Execute the pending snippet");
    println!("  /history [limit]      Show conversation history");
    println!("  /reset                Clear conversation and pending snippet");
    println!("  /endpoint <url>       Set SPIRAL API endpoint");
    println!("  /key <api key>        Set SPIRAL API key");
    println!("  /config               Show current configuration");
    println!("  /debug [on|off]       Toggle state output");
}

pub fn turn(turn: &TurnView) {
    println!("{}> {}", turn.role, turn.content);
    if let Some(snippet) = &turn.snippet {
        println!("--- snippet ---");
        println!("{}", snippet);
        println!("---------------");
    }
    if let Some(result) = &turn.result {
        println!("result: {}", pretty(result));
    }
    if turn.ready {
        println!("(/exec で実行します)");
    }
}

pub fn turns(items: &[TurnView], with_time: bool) {
    if items.is_empty() {
        println!("no history");
        return;
    }
    for item in items {
        if with_time {
            println!("[{}]", item.created_at);
        }
        turn(item);
    }
}

pub fn state(state: &Value, pending: Option<&str>) {
    match pending {
        Some(param) => println!("state: {} (waiting for {})", state, param),
        None => println!("state: {}", state),
    }
}

pub fn config(cfg: &CLIConfig, remote: &ConfigResponse) {
    println!("config:");
    println!("  server: {}", cfg.base_url);
    println!("  endpoint: {}", remote.endpoint);
    println!("  api key: {}", if remote.has_api_key { "set" } else { "not set" });
    println!("  debug: {}", cfg.debug);
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
