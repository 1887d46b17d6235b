use std::io;

use crate::client::HTTPClient;
use crate::models::{CLIConfig, ConfigRequest, SessionReply};
use crate::render;

pub struct REPL {
    pub config: CLIConfig,
    pub client: HTTPClient,
}

impl REPL {
    pub fn new(config: CLIConfig, client: HTTPClient) -> Self {
        Self { config, client }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        loop {
            render::prompt();
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('/') {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            let reply = self.client.chat(&line);
            self.show(reply);
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(),
            "exec" => {
                let reply = self.client.execute();
                self.show(reply);
            }
            "history" => {
                let limit = rest.parse::<usize>().unwrap_or(self.config.history_limit);
                match self.client.history(limit) {
                    Ok(history) => {
                        render::turns(&history.turns, self.config.debug);
                        if self.config.debug {
                            render::state(&history.state, None);
                        }
                    }
                    Err(err) => render::error(&err),
                }
            }
            "reset" => match self.client.reset() {
                Ok(_) => render::info("conversation cleared"),
                Err(err) => render::error(&err),
            },
            "endpoint" => {
                if rest.is_empty() {
                    render::error("usage: /endpoint <url>");
                } else {
                    self.configure(ConfigRequest {
                        endpoint: Some(rest.to_string()),
                        api_key: None,
                    });
                }
            }
            "key" => {
                if rest.is_empty() {
                    render::error("usage: /key <api key>");
                } else {
                    self.configure(ConfigRequest {
                        endpoint: None,
                        api_key: Some(rest.to_string()),
                    });
                }
            }
            "config" => self.configure(ConfigRequest::default()),
            "debug" => {
                if rest.is_empty() {
                    self.config.debug = !self.config.debug;
                } else if let Some(flag) = parse_on_off(rest) {
                    self.config.debug = flag;
                } else {
                    render::error("invalid debug flag");
                    return false;
                }
                render::info(&format!("debug: {}", self.config.debug));
            }
            _ => render::info("unknown command, type /help"),
        }
        false
    }

    fn configure(&self, req: ConfigRequest) {
        match self.client.configure(&req) {
            Ok(remote) => render::config(&self.config, &remote),
            Err(err) => render::error(&err),
        }
    }

    fn show(&self, reply: Result<SessionReply, String>) {
        match reply {
            Ok(reply) => {
                for turn in reply.turns.iter().filter(|t| t.role != "user") {
                    render::turn(turn);
                }
                if self.config.debug {
                    render::state(&reply.state, reply.pending_param.as_deref());
                }
            }
            Err(err) => render::error(&err),
        }
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_off_parsing() {
        assert_eq!(parse_on_off("ON"), Some(true));
        assert_eq!(parse_on_off("no"), Some(false));
        assert_eq!(parse_on_off("maybe"), None);
    }
}
