//! Chat agent configuration (TOML).
//!
//! ```toml
//! [llm]
//! model = "qwen3:32b"
//! model_server = "http://localhost:11434/v1/"
//! api_key = ""            # empty: use OPENAI_API_KEY
//! top_p = 0.8
//!
//! [agent]
//! system_prompt = "You are a expert in power system."
//! max_tool_rounds = 8
//!
//! [[mcp_servers]]
//! name = "powerflow"
//! command = "powerflow-mcp"
//! args = ["serve"]
//!
//! [[mcp_servers]]
//! name = "filesystem"
//! command = "npx"
//! args = ["-y", "@modelcontextprotocol/server-filesystem", "~/.cache/powerflow-mcp"]
//!
//! [code_interpreter]
//! enabled = true
//! command = "python3"
//!
//! [ui]
//! addr = "127.0.0.1:7860"
//! session_idle_secs = 3600
//! max_sessions = 100
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default = "default_mcp_servers")]
    pub mcp_servers: Vec<McpServerConfig>,
    #[serde(default)]
    pub code_interpreter: CodeInterpreterConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            agent: AgentConfig::default(),
            mcp_servers: default_mcp_servers(),
            code_interpreter: CodeInterpreterConfig::default(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended
    #[serde(default = "default_model_server")]
    pub model_server: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            model_server: default_model_server(),
            api_key: String::new(),
            top_p: default_top_p(),
            max_tokens: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

impl LlmConfig {
    /// The configured key, or `OPENAI_API_KEY` when the config leaves it empty.
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(&self.api_key, std::env::var(API_KEY_ENV).ok())
    }
}

fn resolve_api_key(configured: &str, from_env: Option<String>) -> Option<String> {
    if !configured.trim().is_empty() {
        return Some(configured.trim().to_string());
    }
    from_env
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn default_model() -> String {
    "qwen3:32b".to_string()
}

fn default_model_server() -> String {
    "http://localhost:11434/v1/".to_string()
}

fn default_top_p() -> f64 {
    0.8
}

fn default_request_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are a expert in power system.".to_string()
}

fn default_max_tool_rounds() -> usize {
    8
}

/// An MCP server launched as a child process speaking MCP on stdio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Prefix of the tool names exposed to the model
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// When false, a server that fails to start is skipped with a warning
    #[serde(default = "default_true")]
    pub required: bool,
}

/// The powerflow tool server, then read access to the directory it saves solved
/// networks to.
fn default_mcp_servers() -> Vec<McpServerConfig> {
    vec![
        McpServerConfig {
            name: "powerflow".to_string(),
            command: "powerflow-mcp".to_string(),
            args: vec!["serve".to_string()],
            env: BTreeMap::new(),
            required: true,
        },
        McpServerConfig {
            name: "filesystem".to_string(),
            command: "npx".to_string(),
            args: vec![
                "-y".to_string(),
                "@modelcontextprotocol/server-filesystem".to_string(),
                powerflow_scratch_dir().to_string_lossy().into_owned(),
            ],
            env: BTreeMap::new(),
            required: false,
        },
    ]
}

/// Where `powerflow-mcp` keeps solved networks when not configured otherwise
pub fn powerflow_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("powerflow-mcp")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeInterpreterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interpreter")]
    pub command: String,
    /// Arguments placed before the script path
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_code_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for CodeInterpreterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_interpreter(),
            args: Vec::new(),
            timeout_secs: default_code_timeout(),
            work_dir: default_work_dir(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl CodeInterpreterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_code_timeout() -> u64 {
    60
}

fn default_work_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("powerflow-chat")
        .join("workspace")
}

fn default_max_output_bytes() -> usize {
    16 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
    /// Conversations untouched for this long are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    /// Least recently used conversations are dropped beyond this count
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl UiConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7860))
}

fn default_session_idle_secs() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ChatConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
