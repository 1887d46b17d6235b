use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::session::{AssistantSession, SessionReply};

type SharedSession = Arc<Mutex<AssistantSession>>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigRequest {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub endpoint: String,
    pub has_api_key: bool,
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_chat(
    State(session): State<SharedSession>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<SessionReply>, (StatusCode, Json<Value>)> {
    if req.message.trim().is_empty() {
        return Err(bad_request("message required"));
    }
    with_session(session, move |s| s.handle_input(&req.message)).await
}

pub async fn handle_execute(
    State(session): State<SharedSession>,
) -> Result<Json<SessionReply>, (StatusCode, Json<Value>)> {
    with_session(session, |s| s.confirm()).await
}

pub async fn handle_history(
    State(session): State<SharedSession>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let limit = query.limit.unwrap_or(50);
    let session = session.lock().map_err(|_| internal("session lock error"))?;
    Ok(Json(json!({
        "turns": session.history(limit),
        "state": session.state(),
    })))
}

pub async fn handle_config(
    State(session): State<SharedSession>,
    Json(req): Json<ConfigRequest>,
) -> Result<Json<ConfigResponse>, (StatusCode, Json<Value>)> {
    let mut session = session.lock().map_err(|_| internal("session lock error"))?;
    session.set_endpoint(req.endpoint, req.api_key);
    Ok(Json(ConfigResponse {
        endpoint: session.endpoint().base_url.clone(),
        has_api_key: session.endpoint().has_api_key(),
    }))
}

pub async fn handle_reset(State(session): State<SharedSession>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut session = session.lock().map_err(|_| internal("session lock error"))?;
    session.reset();
    Ok(Json(json!({"status": "ok"})))
}

/// Runs `op` on a blocking thread so outbound HTTP calls do not stall the runtime.
async fn with_session<F>(session: SharedSession, op: F) -> Result<Json<SessionReply>, (StatusCode, Json<Value>)>
where
    F: FnOnce(&mut AssistantSession) -> SessionReply + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        let mut session = session.lock().map_err(|_| "session lock error".to_string())?;
        Ok::<_, String>(op(&mut *session))
    })
    .await;

    match result {
        Ok(Ok(reply)) => Ok(Json(reply)),
        Ok(Err(err)) => Err(internal(&err)),
        Err(err) => Err(internal(&err.to_string())),
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

fn internal(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": message})))
}
