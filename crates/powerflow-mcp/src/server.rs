use std::sync::Arc;

use base64::Engine as _;
use powerflow_core::PowerflowResult;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Deserialize;
use tracing::warn;

use crate::progress::PeerProgress;
use crate::service::{Analysis, PowerflowService, RunOutcome};

const INSTRUCTIONS: &str = "Power system analysis tools. Call get_available_networks to see \
which networks exist, run_pf to solve one with an AC power flow, then analysis_pf_result to \
plot its bus voltages against distance from the slack bus. analysis_pf_result only works \
after run_pf succeeded for the same network.";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NetworkRequest {
    /// Network name as returned by get_available_networks, e.g. "case9"
    pub network: String,
}

#[derive(Clone)]
pub struct PowerflowServer {
    service: Arc<PowerflowService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PowerflowServer {
    pub fn new(service: Arc<PowerflowService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "List the names of all power networks available for analysis")]
    async fn get_available_networks(&self) -> Result<CallToolResult, McpError> {
        Ok(networks_result(&self.service.list_networks()))
    }

    #[tool(
        description = "Run an AC power flow on a network and save the solved network. Progress is reported as log messages. Returns 'Network not found.' for an unknown name."
    )]
    async fn run_pf(
        &self,
        Parameters(req): Parameters<NetworkRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let progress = PeerProgress::new(context.peer.clone());
        let result = self.service.run(&req.network, &progress).await;
        Ok(run_result(result))
    }

    #[tool(
        description = "Plot bus voltage magnitude (p.u.) against topological distance from the slack bus for a network solved by run_pf. Returns a PNG image."
    )]
    async fn analysis_pf_result(
        &self,
        Parameters(req): Parameters<NetworkRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(analysis_result(self.service.analyze(&req.network).await))
    }
}

#[tool_handler]
impl ServerHandler for PowerflowServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            ..Default::default()
        }
    }
}

fn networks_result(names: &[String]) -> CallToolResult {
    match serde_json::to_string(names) {
        Ok(json) => CallToolResult::success(vec![Content::text(json)]),
        Err(err) => CallToolResult::error(vec![Content::text(err.to_string())]),
    }
}

fn run_result(result: PowerflowResult<RunOutcome>) -> CallToolResult {
    match result {
        Ok(outcome) => CallToolResult::success(vec![Content::text(outcome.message())]),
        Err(err) => {
            warn!(error = %err, "run_pf failed");
            CallToolResult::error(vec![Content::text(err.to_string())])
        }
    }
}

fn analysis_result(result: PowerflowResult<Analysis>) -> CallToolResult {
    match result {
        Ok(analysis) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&analysis.png);
            CallToolResult::success(vec![Content::image(encoded, "image/png")])
        }
        Err(err) => {
            warn!(error = %err, "analysis_pf_result failed");
            CallToolResult::error(vec![Content::text(err.to_string())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace;
    use powerflow_algo::AcPowerFlowSolver;
    use powerflow_core::{PowerFlowResults, PowerflowError};
    use powerflow_io::Catalog;
    use std::path::PathBuf;

    fn server(dir: &std::path::Path) -> PowerflowServer {
        let service = PowerflowService::new(
            Catalog::builtin(),
            Workspace::create(dir).unwrap(),
            AcPowerFlowSolver::new(),
        );
        PowerflowServer::new(Arc::new(service))
    }

    #[test]
    fn exposes_three_tools() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["analysis_pf_result", "get_available_networks", "run_pf"]
        );
    }

    #[test]
    fn info_advertises_tools_and_logging() {
        let dir = tempfile::tempdir().unwrap();
        let info = server(dir.path()).get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.logging.is_some());
        assert!(info.instructions.unwrap().contains("run_pf"));
    }

    #[test]
    fn networks_are_a_json_array() {
        let result = networks_result(&["case9".to_string(), "case14".to_string()]);
        assert_ne!(result.is_error, Some(true));
        let text = result.content[0].as_text().unwrap().text.clone();
        assert_eq!(text, r#"["case9","case14"]"#);
    }

    #[test]
    fn not_found_is_a_normal_result() {
        let result = run_result(Ok(RunOutcome::NotFound));
        assert_ne!(result.is_error, Some(true));
        assert_eq!(result.content[0].as_text().unwrap().text, "Network not found.");
    }

    #[test]
    fn solved_message_is_returned() {
        let result = run_result(Ok(RunOutcome::Solved {
            path: PathBuf::from("/scratch/case9.json"),
            results: PowerFlowResults::default(),
        }));
        assert!(result.content[0]
            .as_text()
            .unwrap()
            .text
            .contains("completed successfully"));
    }

    #[test]
    fn errors_are_flagged() {
        let result = run_result(Err(PowerflowError::Solver(
            "did not converge after 10 iterations".into(),
        )));
        assert_eq!(result.is_error, Some(true));
        assert!(result.content[0]
            .as_text()
            .unwrap()
            .text
            .contains("did not converge"));

        let result = analysis_result(Err(PowerflowError::NoSlack));
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn analysis_returns_png_image() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let progress = crate::progress::CollectingProgress::new();
        server.service.run("case9", &progress).await.unwrap();

        let result = analysis_result(server.service.analyze("case9").await);
        assert_ne!(result.is_error, Some(true));
        let image = result.content[0].as_image().unwrap();
        assert_eq!(image.mime_type, "image/png");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&image.data)
            .unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }
}
