//! Chat model clients.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{ChatError, ChatResult};
use crate::message::{ChatMessage, ModelReply, ToolCall, ToolSpec};

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> ChatResult<ModelReply>;
}

/// Client for any server implementing the OpenAI Chat Completions API
/// (OpenAI, Ollama, vLLM, LM Studio, ...).
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    top_p: Option<f64>,
    max_tokens: Option<u32>,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> ChatResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            top_p: None,
            max_tokens: None,
        })
    }

    pub fn from_config(config: &LlmConfig) -> ChatResult<Self> {
        let mut client = Self::new(&config.model_server, &config.model)?;
        client.http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        client.api_key = config.api_key();
        client.top_p = Some(config.top_p);
        client.max_tokens = config.max_tokens;
        Ok(client)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request_body(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(ChatMessage::to_openai).collect::<Vec<_>>(),
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(top_p) = self.top_p {
                obj.insert("top_p".into(), top_p.into());
            }
            if let Some(max) = self.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
            if !tools.is_empty() {
                let defs: Vec<Value> = tools.iter().map(ToolSpec::to_openai).collect();
                obj.insert("tools".into(), defs.into());
            }
        }
        body
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> ChatResult<ModelReply> {
        let body = self.build_request_body(messages, tools);
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "chat completion request"
        );

        let mut request = self.http.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: CompletionResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or(ChatError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(idx, call)| ToolCall {
                // some local servers omit ids
                id: call.id.unwrap_or_else(|| format!("call_{idx}")),
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(ModelReply {
            content: choice.message.content.filter(|text| !text.is_empty()),
            tool_calls,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<CompletionToolCall>>,
}

#[derive(Debug, Deserialize)]
struct CompletionToolCall {
    #[serde(default)]
    id: Option<String>,
    function: CompletionFunction,
}

#[derive(Debug, Deserialize)]
struct CompletionFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}
