//! Browser UI and its JSON API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{Agent, ToolCallRecord};
use crate::config::UiConfig;
use crate::message::ChatMessage;

const INDEX_HTML: &str = include_str!("../ui/index.html");

struct Session {
    history: Vec<ChatMessage>,
    last_used: Instant,
}

/// Shared state of the UI: the agent and the in-memory conversations.
///
/// Conversations idle longer than the idle timeout are dropped, and the least
/// recently used ones go once there are more than `max_sessions`.
pub struct AppState {
    agent: Agent,
    sessions: Mutex<HashMap<Uuid, Session>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl AppState {
    pub fn new(agent: Agent) -> Self {
        let defaults = UiConfig::default();
        Self {
            agent,
            sessions: Mutex::new(HashMap::new()),
            idle_timeout: defaults.session_idle_timeout(),
            max_sessions: defaults.max_sessions,
        }
    }

    pub fn with_config(self, config: &UiConfig) -> Self {
        self.with_session_limits(config.session_idle_timeout(), config.max_sessions)
    }

    pub fn with_session_limits(mut self, idle_timeout: Duration, max_sessions: usize) -> Self {
        self.idle_timeout = idle_timeout;
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn history(&self, id: Uuid) -> Vec<ChatMessage> {
        let mut sessions = self.sessions.lock().await;
        evict_sessions(&mut sessions, Instant::now(), self.idle_timeout, self.max_sessions);
        sessions
            .get(&id)
            .map(|session| session.history.clone())
            .unwrap_or_default()
    }

    async fn store(&self, id: Uuid, history: Vec<ChatMessage>) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            id,
            Session {
                history,
                last_used: now,
            },
        );
        evict_sessions(&mut sessions, now, self.idle_timeout, self.max_sessions);
    }
}

fn evict_sessions(
    sessions: &mut HashMap<Uuid, Session>,
    now: Instant,
    idle_timeout: Duration,
    max_sessions: usize,
) {
    let before = sessions.len();
    sessions.retain(|_, session| now.saturating_duration_since(session.last_used) < idle_timeout);
    while sessions.len() > max_sessions {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, session)| session.last_used)
            .map(|(id, _)| *id);
        match oldest {
            Some(id) => sessions.remove(&id),
            None => break,
        };
    }
    if sessions.len() < before {
        debug!(dropped = before - sessions.len(), kept = sessions.len(), "evicted chat sessions");
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub reply: String,
    /// `data:` URLs
    pub images: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .route("/api/reset", post(reset))
        .route("/api/tools", get(list_tools))
        .layer(Extension(state))
}

pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "chat UI listening");
    serve(listener, router(state)).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "message must not be empty".to_string(),
        });
    }

    let session_id = req.session_id.unwrap_or_else(Uuid::new_v4);
    let mut history = state.history(session_id).await;

    // the lock is not held while the model and tools run
    let reply = match state.agent.respond(&mut history, message).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(%session_id, error = %err, "chat turn failed");
            return Err(ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: err.to_string(),
            });
        }
    };
    state.store(session_id, history).await;

    Ok(Json(ChatResponse {
        session_id,
        reply: reply.reply,
        images: reply.images.iter().map(|image| image.data_url()).collect(),
        tool_calls: reply.tool_calls,
    }))
}

async fn reset(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> StatusCode {
    state.sessions.lock().await.remove(&req.session_id);
    StatusCode::NO_CONTENT
}

async fn list_tools(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<ToolSummary>> {
    Json(
        state
            .agent
            .tools()
            .specs()
            .iter()
            .map(|spec| ToolSummary {
                name: spec.name.clone(),
                description: spec.description.clone(),
            })
            .collect(),
    )
}
