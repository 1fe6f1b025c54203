mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use powerflow_chat::tools::{CodeInterpreter, McpToolProvider};
use powerflow_chat::web::{run_server, AppState};
use powerflow_chat::{Agent, ChatConfig, OpenAiCompatClient, ToolRegistry};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing(cli: &Cli, config: &ChatConfig) -> Result<()> {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.logging.level)?,
        },
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("setting default subscriber failed: {err}"))
}

async fn build_registry(config: &ChatConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for server in &config.mcp_servers {
        match McpToolProvider::connect(server).await {
            Ok(provider) => registry.register(Arc::new(provider)),
            Err(err) if !server.required => {
                warn!(server = %server.name, error = %err, "optional MCP server unavailable");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("starting MCP server '{}'", server.name))
            }
        }
    }
    if config.code_interpreter.enabled {
        let interpreter = CodeInterpreter::from_config(&config.code_interpreter)
            .context("preparing code interpreter work directory")?;
        registry.register(Arc::new(interpreter));
    }
    info!(tools = registry.len(), "tool registry ready");
    Ok(registry)
}

async fn run(cli: Cli) -> Result<()> {
    let config = ChatConfig::load_or_default(cli.config.as_deref())?;
    init_tracing(&cli, &config)?;

    let model = OpenAiCompatClient::from_config(&config.llm).context("building model client")?;
    let registry = build_registry(&config).await?;
    let agent = Agent::new(Arc::new(model), Arc::new(registry)).with_config(&config.agent);

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or(config.ui.addr);
            let state = AppState::new(agent).with_config(&config.ui);
            run_server(addr, Arc::new(state)).await?;
        }
        Commands::Ask { message } => {
            let mut history = Vec::new();
            let reply = agent.respond(&mut history, &message).await?;
            for call in &reply.tool_calls {
                info!(tool = %call.name, is_error = call.is_error, "tool used");
            }
            println!("{}", reply.reply);
            if !reply.images.is_empty() {
                println!("({} image(s) omitted)", reply.images.len());
            }
        }
        Commands::Tools => {
            for spec in agent.tools().specs() {
                println!("{}\t{}", spec.name, spec.description);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
