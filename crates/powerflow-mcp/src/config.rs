//! Tool server configuration.
//!
//! Read from a TOML file; every section and field is optional:
//!
//! ```toml
//! [workspace]
//! scratch_dir = "/var/tmp/powerflow"
//!
//! [catalog]
//! cases_dir = "./cases"
//!
//! [solver]
//! tolerance = 1e-8
//! max_iterations = 10
//! enforce_q_limits = false
//! linear_solver = "faer"
//!
//! [plot]
//! width = 1000
//! height = 600
//!
//! [logging]
//! level = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use powerflow_algo::AcPowerFlowSolver;
use powerflow_core::LinearSolverKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Solved networks are stored here as `<name>.json`
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
        }
    }
}

fn default_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("powerflow-mcp")
}

/// Extra MATPOWER cases on top of the builtin ones.
///
/// Large grids (case118, case300, the RTE and PEGASE cases) are not compiled in;
/// drop their `.m` files into `cases_dir`, or into [`default_cases_dir`] when no
/// directory is configured.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub cases_dir: Option<PathBuf>,
}

impl CatalogConfig {
    /// Directory to scan at startup, if any.
    pub fn effective_cases_dir(&self) -> Option<PathBuf> {
        resolve_cases_dir(self.cases_dir.as_deref(), &default_cases_dir())
    }
}

/// `<data dir>/powerflow-mcp/cases`
pub fn default_cases_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("powerflow-mcp")
        .join("cases")
}

// A configured directory must exist; the default one is optional.
fn resolve_cases_dir(configured: Option<&Path>, default: &Path) -> Option<PathBuf> {
    match configured {
        Some(dir) => Some(dir.to_path_buf()),
        None => default.is_dir().then(|| default.to_path_buf()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub enforce_q_limits: bool,
    #[serde(default)]
    pub linear_solver: LinearSolverKind,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            enforce_q_limits: false,
            linear_solver: LinearSolverKind::default(),
        }
    }
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_max_iterations() -> usize {
    10
}

impl SolverConfig {
    pub fn build(&self) -> AcPowerFlowSolver {
        AcPowerFlowSolver::new()
            .with_tolerance(self.tolerance)
            .with_max_iterations(self.max_iterations)
            .with_q_limit_enforcement(self.enforce_q_limits)
            .with_linear_solver(self.linear_solver)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Used when neither `--log-level` nor `RUST_LOG` is set
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

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
