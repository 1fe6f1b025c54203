//! # powerflow-chat: a chat assistant for power system studies
//!
//! An [`Agent`] talks to an OpenAI-compatible model ([`OpenAiCompatClient`]) and lets
//! it call tools from MCP servers ([`tools::McpToolProvider`], by default the
//! `powerflow-mcp` server) and a local [`tools::CodeInterpreter`]. [`web`] serves a
//! small browser UI on top.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod message;
pub mod tools;
pub mod web;

pub use agent::{Agent, AgentReply, ToolCallRecord};
pub use config::ChatConfig;
pub use error::{ChatError, ChatResult};
pub use llm::{ChatModel, OpenAiCompatClient};
pub use message::{ChatMessage, ModelReply, Role, ToolCall, ToolSpec};
pub use tools::{ToolImage, ToolOutput, ToolProvider, ToolRegistry};
