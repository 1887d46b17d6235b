use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{ErrorBody, HttpMethod, RequestError, RequestExecutor};
use crate::config::{EndpointConfig, DEFAULT_LOG_BODY_LIMIT};

/// Blocking executor for the SPIRAL REST API.
pub struct SpiralExecutor {
    endpoint: EndpointConfig,
    client: Client,
    log_body_limit: usize,
}

impl SpiralExecutor {
    pub fn new(endpoint: EndpointConfig) -> Result<Self, RequestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", endpoint.api_key);
        let mut auth = HeaderValue::from_str(&bearer).map_err(|err| RequestError::Network {
            message: format!("invalid API key header: {}", err),
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| RequestError::Network {
                message: err.to_string(),
            })?;
        Ok(Self {
            endpoint,
            client,
            log_body_limit: DEFAULT_LOG_BODY_LIMIT,
        })
    }

    pub fn with_log_body_limit(mut self, limit: usize) -> Self {
        self.log_body_limit = limit;
        self
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }
}

impl RequestExecutor for SpiralExecutor {
    fn execute(&self, method: HttpMethod, path: &str, data: Option<&Value>) -> Result<Value, RequestError> {
        let url = join_url(&self.endpoint.base_url, path);
        info!(%method, %url, "executing API request");

        let mut request = self.client.request(method.to_reqwest(), url.as_str());
        if let Some(body) = data.filter(|value| has_content(value)) {
            debug!(body = %truncate_for_log(&body.to_string(), self.log_body_limit), "request body");
            request = request.json(body);
        }

        let resp = request.send().map_err(|err| {
            warn!(%url, error = %err, "API request did not complete");
            RequestError::Network {
                message: err.to_string(),
            }
        })?;

        let status = resp.status();
        let text = resp.text().map_err(|err| RequestError::Network {
            message: err.to_string(),
        })?;
        info!(status = status.as_u16(), %url, "API response received");
        debug!(body = %truncate_for_log(&text, self.log_body_limit), "response body");

        if status.is_client_error() || status.is_server_error() {
            let body = if text.trim().is_empty() {
                None
            } else {
                match serde_json::from_str::<Value>(&text) {
                    Ok(parsed) => Some(ErrorBody::Json(parsed)),
                    Err(_) => Some(ErrorBody::Text(text)),
                }
            };
            warn!(status = status.as_u16(), %url, "API returned an error status");
            return Err(RequestError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<Value>(&text).map_err(|_| {
            warn!(status = status.as_u16(), %url, "API returned a non-JSON body");
            RequestError::InvalidResponse {
                status: status.as_u16(),
                body: text,
            }
        })
    }
}

/// Joins base and path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

pub(crate) fn truncate_for_log(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}... ({} chars total)", cut, text.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_url_never_doubles_or_drops_the_slash() {
        let bases = ["https://api.test/v1", "https://api.test/v1/", "https://api.test/v1//"];
        let paths = ["apps", "/apps", "//apps/1/dbs"];
        for base in bases {
            for path in paths {
                let url = join_url(base, path);
                let tail = url.trim_start_matches("https://");
                assert!(!tail.contains("//"), "doubled slash in {}", url);
                assert!(url.starts_with("https://api.test/v1/apps"), "bad join {}", url);
            }
        }
    }

    #[test]
    fn empty_bodies_are_not_sent() {
        assert!(!has_content(&Value::Null));
        assert!(!has_content(&json!({})));
        assert!(has_content(&json!({"name": "members_db"})));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "会員データベース".repeat(10);
        let cut = truncate_for_log(&text, 5);
        assert!(cut.starts_with("会員データ"));
        assert!(cut.ends_with("(80 chars total)"));
        assert_eq!(truncate_for_log("short", 10), "short");
    }
}
