//! # powerflow-mcp: power flow tools over the Model Context Protocol
//!
//! Three tools are served on stdio:
//!
//! - `get_available_networks` - catalog names as a JSON array
//! - `run_pf` - build, solve and persist a network, streaming progress as log messages
//! - `analysis_pf_result` - PNG plot of bus voltage against distance from the slack bus
//!
//! The workflows live in [`service`] so the CLI subcommands can run them without
//! an MCP client.

pub mod config;
pub mod progress;
pub mod server;
pub mod service;
pub mod workspace;

pub use config::ServerConfig;
pub use progress::{CollectingProgress, PeerProgress, ProgressSink, StdoutProgress};
pub use server::PowerflowServer;
pub use service::{Analysis, PowerflowService, RunOutcome, NOT_FOUND_MESSAGE};
pub use workspace::Workspace;
