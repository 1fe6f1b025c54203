#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use powerflow_chat::{
    ChatError, ChatMessage, ChatModel, ChatResult, ModelReply, ToolCall, ToolOutput,
    ToolProvider, ToolSpec,
};
use serde_json::{json, Map, Value};

/// Plays back canned replies and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelReply>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::default(),
        })
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage], _tools: &[ToolSpec]) -> ChatResult<ModelReply> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ChatError::EmptyResponse)
    }
}

pub fn text(content: &str) -> ModelReply {
    ModelReply {
        content: Some(content.to_string()),
        tool_calls: Vec::new(),
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> ModelReply {
    ModelReply {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
    }
}

/// Stand-in for the powerflow MCP server.
pub struct FakePowerflow;

#[async_trait]
impl ToolProvider for FakePowerflow {
    fn tools(&self) -> Vec<ToolSpec> {
        ["get_available_networks", "run_pf", "analysis_pf_result"]
            .iter()
            .map(|tool| ToolSpec {
                name: format!("powerflow__{tool}"),
                description: format!("{tool} tool"),
                parameters: json!({"type": "object"}),
            })
            .collect()
    }

    async fn call(&self, name: &str, arguments: Map<String, Value>) -> ChatResult<ToolOutput> {
        let network = arguments.get("network").and_then(Value::as_str).unwrap_or("");
        Ok(match name {
            "powerflow__get_available_networks" => {
                ToolOutput::text(r#"["case9","case14","case30","ieee30"]"#)
            }
            "powerflow__run_pf" if network == "case9" => ToolOutput::text(
                "Powerflow completed successfully and network saved to /tmp/case9.json.",
            ),
            "powerflow__run_pf" => ToolOutput::text("Network not found."),
            "powerflow__analysis_pf_result" => {
                let mut output = ToolOutput::default();
                output.images.push(powerflow_chat::ToolImage::png("iVBORw0KGgo="));
                output
            }
            _ => ToolOutput::error("unexpected tool"),
        })
    }
}
