use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "powerflow-mcp", author, version, about = "Power flow tools for MCP clients", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory for solved networks (overrides the config file)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub scratch_dir: Option<PathBuf>,

    /// Directory of extra MATPOWER cases (overrides the config file)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub cases_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "powerflow_algo=trace"; falls back to RUST_LOG
    /// and then to the config file
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the tools over MCP on stdin/stdout (default)
    Serve,
    /// Print the available networks, one per line
    List,
    /// Run the power flow on a network and save the result
    Run {
        /// Network name
        network: String,
    },
    /// Plot the voltage profile of a solved network
    Analyze {
        /// Network name
        network: String,
        /// Output PNG file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },
}
