mod cli;

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use powerflow_mcp::{PowerflowServer, PowerflowService, RunOutcome, ServerConfig, StdoutProgress};
use rmcp::ServiceExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing(cli: &Cli, config: &ServerConfig) -> Result<()> {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.logging.level)?,
        },
    };
    // stdout carries MCP frames
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("setting default subscriber failed: {err}"))
}

fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = ServerConfig::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = &cli.scratch_dir {
        config.workspace.scratch_dir = dir.clone();
    }
    if let Some(dir) = &cli.cases_dir {
        config.catalog.cases_dir = Some(dir.clone());
    }
    Ok(config)
}

async fn serve(service: PowerflowService) -> Result<()> {
    info!("serving powerflow tools on stdio");
    let server = PowerflowServer::new(Arc::new(service))
        .serve(rmcp::transport::io::stdio())
        .await
        .context("starting MCP server")?;
    let reason = server.waiting().await?;
    info!(?reason, "MCP session ended");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    init_tracing(&cli, &config)?;
    let service = PowerflowService::from_config(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(service).await?,
        Commands::List => {
            for name in service.list_networks() {
                println!("{name}");
            }
        }
        Commands::Run { network } => {
            let outcome = service.run(&network, &StdoutProgress).await?;
            println!("{}", outcome.message());
            if let RunOutcome::Solved { results, .. } = outcome {
                info!(
                    iterations = results.iterations,
                    max_mismatch = results.max_mismatch,
                    "power flow summary"
                );
            }
        }
        Commands::Analyze { network, output } => {
            let analysis = service.analyze(&network).await?;
            fs::write(&output, &analysis.png)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "Voltage profile of {network} ({} buses, slack {}) written to {}",
                analysis.profile.len(),
                analysis.profile.slack,
                output.display()
            );
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
