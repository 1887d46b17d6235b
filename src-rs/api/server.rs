use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::api::handlers::{handle_chat, handle_config, handle_execute, handle_health, handle_history, handle_reset};
use crate::session::AssistantSession;

pub struct AssistantServer {
    pub port: u16,
    pub session: Arc<Mutex<AssistantSession>>,
}

impl AssistantServer {
    pub fn new(port: u16, session: AssistantSession) -> Self {
        Self {
            port,
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route("/chat", post(handle_chat))
            .route("/execute", post(handle_execute))
            .route("/history", get(handle_history))
            .route("/config", post(handle_config))
            .route("/reset", post(handle_reset))
            .with_state(self.session.clone())
    }

    pub async fn start(&self) -> Result<(), String> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!(%addr, "spiral-assistant listening");
        axum::Server::bind(&addr)
            .serve(self.router().into_make_service())
            .await
            .map_err(|err| err.to_string())
    }
}
