use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, Tool};
use rmcp::service::RunningService;
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{info, warn};

use super::{ToolImage, ToolOutput, ToolProvider};
use crate::config::McpServerConfig;
use crate::error::{ChatError, ChatResult};
use crate::message::ToolSpec;

/// Separator between server name and tool name in exposed tool names
pub const NAME_SEPARATOR: &str = "__";

/// Tools of one MCP server running as a child process.
pub struct McpToolProvider {
    server: String,
    session: RunningService<RoleClient, ()>,
    tools: Vec<Tool>,
}

impl McpToolProvider {
    /// Spawn the server, perform the MCP handshake and list its tools.
    pub async fn connect(config: &McpServerConfig) -> ChatResult<Self> {
        let mut command = Command::new(&config.command);
        command.args(&config.args).envs(&config.env);
        let transport = TokioChildProcess::new(command).map_err(|err| ChatError::Mcp {
            server: config.name.clone(),
            message: format!("cannot spawn '{}': {err}", config.command),
        })?;

        let session = ().serve(transport).await.map_err(|err| ChatError::Mcp {
            server: config.name.clone(),
            message: format!("initialize failed: {err}"),
        })?;
        let tools = session.list_all_tools().await.map_err(|err| ChatError::Mcp {
            server: config.name.clone(),
            message: format!("list_tools failed: {err}"),
        })?;
        info!(server = %config.name, tools = tools.len(), "connected MCP server");

        Ok(Self {
            server: config.name.clone(),
            session,
            tools,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn shutdown(self) {
        if let Err(err) = self.session.cancel().await {
            warn!(server = %self.server, error = %err, "MCP shutdown failed");
        }
    }
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    fn tools(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| tool_spec(&self.server, tool))
            .collect()
    }

    async fn call(&self, name: &str, arguments: Map<String, Value>) -> ChatResult<ToolOutput> {
        let tool = strip_server_prefix(&self.server, name)
            .ok_or_else(|| ChatError::UnknownTool(name.to_string()))?;
        let result = self
            .session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: tool.to_owned().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|err| ChatError::Mcp {
                server: self.server.clone(),
                message: format!("call_tool {tool} failed: {err}"),
            })?;
        Ok(tool_output(result))
    }
}

pub fn exposed_name(server: &str, tool: &str) -> String {
    format!("{server}{NAME_SEPARATOR}{tool}")
}

fn strip_server_prefix<'a>(server: &str, name: &'a str) -> Option<&'a str> {
    name.strip_prefix(server)?.strip_prefix(NAME_SEPARATOR)
}

fn tool_spec(server: &str, tool: &Tool) -> ToolSpec {
    ToolSpec {
        name: exposed_name(server, &tool.name),
        description: tool
            .description
            .as_deref()
            .unwrap_or_default()
            .to_string(),
        parameters: Value::Object((*tool.input_schema).clone()),
    }
}

/// Text items are joined line by line; image items are passed through.
fn tool_output(result: CallToolResult) -> ToolOutput {
    let mut lines = Vec::new();
    let mut images = Vec::new();
    for item in &result.content {
        if let Some(text) = item.as_text() {
            lines.push(text.text.clone());
        } else if let Some(image) = item.as_image() {
            images.push(ToolImage {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            });
        }
    }
    ToolOutput {
        text: lines.join("\n"),
        images,
        is_error: result.is_error.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use std::sync::Arc;

    #[test]
    fn prefix_round_trip() {
        let name = exposed_name("powerflow", "run_pf");
        assert_eq!(name, "powerflow__run_pf");
        assert_eq!(strip_server_prefix("powerflow", &name), Some("run_pf"));
        assert_eq!(strip_server_prefix("power", &name), None);
        assert_eq!(strip_server_prefix("files", &name), None);
    }

    #[test]
    fn spec_uses_prefixed_name_and_schema() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"network": {"type": "string"}},
            "required": ["network"]
        })
        .as_object()
        .unwrap()
        .clone();
        let tool = Tool::new("run_pf", "Run an AC power flow", Arc::new(schema));
        let spec = tool_spec("powerflow", &tool);
        assert_eq!(spec.name, "powerflow__run_pf");
        assert_eq!(spec.description, "Run an AC power flow");
        assert_eq!(spec.parameters["required"][0], "network");
    }

    #[test]
    fn output_collects_text_and_images() {
        let result = CallToolResult::success(vec![
            Content::text("line one"),
            Content::image("iVBORw0KGgo=", "image/png"),
            Content::text("line two"),
        ]);
        let output = tool_output(result);
        assert_eq!(output.text, "line one\nline two");
        assert_eq!(output.images, vec![ToolImage::png("iVBORw0KGgo=")]);
        assert!(!output.is_error);

        let output = tool_output(CallToolResult::error(vec![Content::text("Solver error")]));
        assert!(output.is_error);
    }
}
