//! Progress reporting for long-running tool calls.

use std::sync::Mutex;

use async_trait::async_trait;
use rmcp::model::{LoggingLevel, LoggingMessageNotificationParam};
use rmcp::{Peer, RoleServer};
use tracing::{info, warn};

/// Logger name attached to MCP progress notifications
pub const PROGRESS_LOGGER: &str = "powerflow";

/// Receives human-readable status lines while a workflow runs.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Forwards progress to the MCP client as `notifications/message` at info level.
pub struct PeerProgress {
    peer: Peer<RoleServer>,
}

impl PeerProgress {
    pub fn new(peer: Peer<RoleServer>) -> Self {
        Self { peer }
    }
}

#[async_trait]
impl ProgressSink for PeerProgress {
    async fn notify(&self, message: &str) {
        info!("{message}");
        let param = LoggingMessageNotificationParam {
            level: LoggingLevel::Info,
            logger: Some(PROGRESS_LOGGER.to_string()),
            data: serde_json::Value::String(message.to_string()),
        };
        // a client that went away must not fail the tool call
        if let Err(err) = self.peer.notify_logging_message(param).await {
            warn!(error = %err, "failed to send progress notification");
        }
    }
}

/// Prints each line to stdout; used by the CLI subcommands.
pub struct StdoutProgress;

#[async_trait]
impl ProgressSink for StdoutProgress {
    async fn notify(&self, message: &str) {
        println!("{message}");
    }
}

/// Keeps every message in order.
#[derive(Default)]
pub struct CollectingProgress {
    messages: Mutex<Vec<String>>,
}

impl CollectingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProgressSink for CollectingProgress {
    async fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
