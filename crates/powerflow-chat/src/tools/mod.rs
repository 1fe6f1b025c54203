//! Tools the agent can call: MCP server tools and a local code interpreter.

pub mod code;
pub mod mcp;

pub use code::CodeInterpreter;
pub use mcp::McpToolProvider;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ChatError, ChatResult};
use crate::message::ToolSpec;

/// Base64-encoded image produced by a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolImage {
    pub mime_type: String,
    pub data: String,
}

impl ToolImage {
    pub fn png(data: impl Into<String>) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data: data.into(),
        }
    }

    /// `data:` URL usable directly as an `<img src>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub images: Vec<ToolImage>,
    /// The tool ran but reported a failure
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
            ..Default::default()
        }
    }

    /// What the model sees as the tool message.
    pub fn model_text(&self) -> String {
        let mut text = if self.is_error {
            format!("Error: {}", self.text)
        } else {
            self.text.clone()
        };
        if !self.images.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&format!(
                "[{} image(s) shown to the user]",
                self.images.len()
            ));
        }
        text
    }
}

#[async_trait]
pub trait ToolProvider: Send + Sync {
    fn tools(&self) -> Vec<ToolSpec>;

    async fn call(&self, name: &str, arguments: Map<String, Value>) -> ChatResult<ToolOutput>;
}

/// Routes tool calls to the provider that advertised the tool.
#[derive(Default)]
pub struct ToolRegistry {
    providers: Vec<Arc<dyn ToolProvider>>,
    specs: Vec<ToolSpec>,
    routes: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every tool of `provider`; names already registered keep their first owner.
    pub fn register(&mut self, provider: Arc<dyn ToolProvider>) {
        let index = self.providers.len();
        for spec in provider.tools() {
            if self.routes.contains_key(&spec.name) {
                warn!(tool = %spec.name, "duplicate tool name; keeping the first provider");
                continue;
            }
            self.routes.insert(spec.name.clone(), index);
            self.specs.push(spec);
        }
        self.providers.push(provider);
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Execute a tool with the model's raw JSON arguments.
    pub async fn call(&self, name: &str, raw_arguments: &str) -> ChatResult<ToolOutput> {
        let index = *self
            .routes
            .get(name)
            .ok_or_else(|| ChatError::UnknownTool(name.to_string()))?;
        let arguments = parse_arguments(name, raw_arguments)?;
        debug!(tool = name, "calling tool");
        self.providers[index].call(name, arguments).await
    }
}

/// Models send arguments as JSON text; empty text means no arguments.
pub fn parse_arguments(tool: &str, raw: &str) -> ChatResult<Map<String, Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(ChatError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("expected a JSON object, got {other}"),
        }),
        Err(err) => Err(ChatError::InvalidArguments {
            tool: tool.to_string(),
            message: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo {
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl ToolProvider for Echo {
        fn tools(&self) -> Vec<ToolSpec> {
            self.names
                .iter()
                .map(|name| ToolSpec {
                    name: name.to_string(),
                    description: "echo".into(),
                    parameters: json!({"type": "object"}),
                })
                .collect()
        }

        async fn call(&self, name: &str, arguments: Map<String, Value>) -> ChatResult<ToolOutput> {
            Ok(ToolOutput::text(format!("{name}:{}", Value::Object(arguments))))
        }
    }

    #[tokio::test]
    async fn routes_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo { names: vec!["a__x", "a__y"] }));
        registry.register(Arc::new(Echo { names: vec!["b__x", "a__x"] }));
        assert_eq!(registry.len(), 3);

        let out = registry.call("b__x", r#"{"network":"case9"}"#).await.unwrap();
        assert_eq!(out.text, r#"b__x:{"network":"case9"}"#);

        let out = registry.call("a__y", "").await.unwrap();
        assert_eq!(out.text, "a__y:{}");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::new();
        assert!(matches!(
            registry.call("nope", "{}").await.unwrap_err(),
            ChatError::UnknownTool(name) if name == "nope"
        ));
    }

    #[test]
    fn argument_parsing() {
        assert!(parse_arguments("t", "null").unwrap().is_empty());
        assert_eq!(parse_arguments("t", r#" {"a": 1} "#).unwrap()["a"], 1);
        assert!(matches!(
            parse_arguments("t", "[1, 2]"),
            Err(ChatError::InvalidArguments { .. })
        ));
        assert!(matches!(
            parse_arguments("t", "{broken"),
            Err(ChatError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn model_text_mentions_images() {
        let mut output = ToolOutput::text("done");
        output.images.push(ToolImage::png("AAAA"));
        assert_eq!(output.model_text(), "done\n[1 image(s) shown to the user]");
        assert_eq!(ToolOutput::error("boom").model_text(), "Error: boom");
        assert_eq!(output.images[0].data_url(), "data:image/png;base64,AAAA");
    }
}
