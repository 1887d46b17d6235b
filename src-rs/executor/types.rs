use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP methods a snippet may use. Anything else is rejected while parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body attached to an HTTP error: parsed JSON when possible, raw text otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
}

impl ErrorBody {
    pub fn to_value(&self) -> Value {
        match self {
            ErrorBody::Json(value) => value.clone(),
            ErrorBody::Text(text) => Value::String(text.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestErrorKind {
    NetworkError,
    HttpError,
    InvalidResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("API request failed with status {status}{}", render_body(.body))]
    Http { status: u16, body: Option<ErrorBody> },

    #[error("invalid JSON response from API (status {status})")]
    InvalidResponse { status: u16, body: String },
}

impl RequestError {
    pub fn kind(&self) -> RequestErrorKind {
        match self {
            RequestError::Network { .. } => RequestErrorKind::NetworkError,
            RequestError::Http { .. } => RequestErrorKind::HttpError,
            RequestError::InvalidResponse { .. } => RequestErrorKind::InvalidResponse,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Network { .. } => None,
            RequestError::Http { status, .. } | RequestError::InvalidResponse { status, .. } => {
                Some(*status)
            }
        }
    }
}

fn render_body(body: &Option<ErrorBody>) -> String {
    match body {
        Some(ErrorBody::Json(value)) => format!(": {}", value),
        Some(ErrorBody::Text(text)) => format!(": {}", text),
        None => String::new(),
    }
}

/// One HTTP call against the configured API. The snippet runner only sees this seam.
pub trait RequestExecutor {
    fn execute(&self, method: HttpMethod, path: &str, data: Option<&Value>) -> Result<Value, RequestError>;
}
