use clap::{Parser, Subcommand, ValueHint};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "powerflow-chat", author, version, about = "Chat assistant for power flow studies", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Log filter; falls back to RUST_LOG and then to the config file
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the browser UI (default)
    Serve {
        /// Listen address (overrides the config file)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Ask a single question and print the answer
    Ask {
        message: String,
    },
    /// List the tools available to the model
    Tools,
}
