//! The tool-calling loop.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::{ChatError, ChatResult};
use crate::llm::ChatModel;
use crate::message::ChatMessage;
use crate::tools::{ToolImage, ToolOutput, ToolRegistry};

/// A tool invocation made while answering, as shown in the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: String,
    pub output: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentReply {
    pub reply: String,
    /// Images returned by tools during this turn, in call order
    pub images: Vec<ToolImage>,
    pub tool_calls: Vec<ToolCallRecord>,
}

#[derive(Clone)]
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>) -> Self {
        let defaults = AgentConfig::default();
        Self {
            model,
            tools,
            system_prompt: defaults.system_prompt,
            max_tool_rounds: defaults.max_tool_rounds,
        }
    }

    pub fn with_config(mut self, config: &AgentConfig) -> Self {
        self.system_prompt = config.system_prompt.clone();
        self.max_tool_rounds = config.max_tool_rounds;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `user_message` in the context of `history`.
    ///
    /// The model is called repeatedly; each time it requests tools they are run and
    /// their results appended before the next call. On success `history` holds the
    /// whole exchange; on error it is left as it was.
    pub async fn respond(
        &self,
        history: &mut Vec<ChatMessage>,
        user_message: &str,
    ) -> ChatResult<AgentReply> {
        let checkpoint = history.len();
        let result = self.run_turn(history, user_message).await;
        if result.is_err() {
            history.truncate(checkpoint);
        }
        result
    }

    async fn run_turn(
        &self,
        history: &mut Vec<ChatMessage>,
        user_message: &str,
    ) -> ChatResult<AgentReply> {
        history.push(ChatMessage::user(user_message));
        let mut reply = AgentReply::default();

        for round in 0..=self.max_tool_rounds {
            let messages = self.prompt(history);
            let turn = self.model.complete(&messages, self.tools.specs()).await?;

            if turn.tool_calls.is_empty() {
                let text = turn.content.unwrap_or_default();
                history.push(ChatMessage::assistant(text.clone()));
                info!(
                    rounds = round,
                    tool_calls = reply.tool_calls.len(),
                    "agent answered"
                );
                reply.reply = text;
                return Ok(reply);
            }
            if round == self.max_tool_rounds {
                break;
            }

            history.push(ChatMessage::assistant_tool_calls(
                turn.content,
                turn.tool_calls.clone(),
            ));
            for call in turn.tool_calls {
                debug!(tool = %call.name, arguments = %call.arguments, "model requested tool");
                let output = match self.tools.call(&call.name, &call.arguments).await {
                    Ok(output) => output,
                    Err(err) => {
                        warn!(tool = %call.name, error = %err, "tool call failed");
                        ToolOutput::error(err.to_string())
                    }
                };
                let model_text = output.model_text();
                history.push(ChatMessage::tool_result(&call.id, model_text.clone()));
                reply.images.extend(output.images);
                reply.tool_calls.push(ToolCallRecord {
                    name: call.name,
                    arguments: call.arguments,
                    output: model_text,
                    is_error: output.is_error,
                });
            }
        }

        Err(ChatError::ToolRounds(self.max_tool_rounds))
    }

    fn prompt(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage::system(self.system_prompt.clone()));
        }
        messages.extend_from_slice(history);
        messages
    }
}
