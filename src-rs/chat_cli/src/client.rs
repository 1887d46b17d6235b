use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{ChatRequest, ConfigRequest, ConfigResponse, HistoryReply, SessionReply};

pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        // Generation and execution both wait on remote services.
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }

    pub fn chat(&self, message: &str) -> Result<SessionReply, String> {
        self.post(
            "chat",
            &ChatRequest {
                message: message.to_string(),
            },
        )
    }

    pub fn execute(&self) -> Result<SessionReply, String> {
        self.post("execute", &serde_json::json!({}))
    }

    pub fn history(&self, limit: usize) -> Result<HistoryReply, String> {
        let resp = self
            .client
            .get(self.url(&format!("history?limit={}", limit)))
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    pub fn configure(&self, req: &ConfigRequest) -> Result<ConfigResponse, String> {
        self.post("config", req)
    }

    pub fn reset(&self) -> Result<serde_json::Value, String> {
        self.post("reset", &serde_json::json!({}))
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, String> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    if resp.status().is_success() {
        resp.json::<T>().map_err(|err| err.to_string())
    } else {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        Err(format!("http {}: {}", status.as_u16(), body))
    }
}
