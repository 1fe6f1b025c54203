//! The solve and analysis workflows behind the tools.
//!
//! Both the MCP server and the CLI subcommands drive a [`PowerflowService`];
//! they differ only in the [`ProgressSink`] they pass in and in how they present
//! the outcome.

use std::path::PathBuf;

use anyhow::Context;
use powerflow_algo::{voltage_profile, AcPowerFlowSolver, VoltageProfile};
use powerflow_core::{PowerFlowResults, PowerflowError, PowerflowResult};
use powerflow_io::{load_solved_network, save_network, Catalog};
use powerflow_viz::voltage_profile_plot;
use tracing::{debug, info, instrument};

use crate::config::{PlotConfig, ServerConfig};
use crate::progress::ProgressSink;
use crate::workspace::Workspace;

/// Status text returned for a name that is not in the catalog
pub const NOT_FOUND_MESSAGE: &str = "Network not found.";

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The name is not in the catalog; nothing was built or written
    NotFound,
    Solved {
        path: PathBuf,
        results: PowerFlowResults,
    },
}

impl RunOutcome {
    /// Status line reported back to the caller.
    pub fn message(&self) -> String {
        match self {
            RunOutcome::NotFound => NOT_FOUND_MESSAGE.to_string(),
            RunOutcome::Solved { path, .. } => format!(
                "Powerflow completed successfully and network saved to {}.",
                path.display()
            ),
        }
    }
}

/// Rendered voltage profile of a solved network.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub profile: VoltageProfile,
    /// PNG-encoded scatter plot
    pub png: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PowerflowService {
    catalog: Catalog,
    workspace: Workspace,
    solver: AcPowerFlowSolver,
    plot: PlotConfig,
}

impl PowerflowService {
    pub fn new(catalog: Catalog, workspace: Workspace, solver: AcPowerFlowSolver) -> Self {
        Self {
            catalog,
            workspace,
            solver,
            plot: PlotConfig::default(),
        }
    }

    pub fn with_plot(mut self, plot: PlotConfig) -> Self {
        self.plot = plot;
        self
    }

    /// Build the catalog, create the scratch directory and configure the solver.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let catalog = match config.catalog.effective_cases_dir() {
            Some(dir) => Catalog::with_cases_dir(&dir)
                .with_context(|| format!("loading cases from {}", dir.display()))?,
            None => Catalog::builtin(),
        };
        let workspace = Workspace::create(&config.workspace.scratch_dir).with_context(|| {
            format!(
                "creating scratch directory {}",
                config.workspace.scratch_dir.display()
            )
        })?;
        info!(
            cases = catalog.len(),
            scratch = %workspace.root().display(),
            linear_solver = config.solver.linear_solver.as_str(),
            "powerflow service ready"
        );
        Ok(Self::new(catalog, workspace, config.solver.build()).with_plot(config.plot.clone()))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn list_networks(&self) -> Vec<String> {
        self.catalog.list_cases()
    }

    /// Build, solve and persist the named network.
    ///
    /// An unknown name is not an error: it yields [`RunOutcome::NotFound`] without
    /// touching the scratch directory.
    #[instrument(skip(self, progress))]
    pub async fn run(
        &self,
        name: &str,
        progress: &dyn ProgressSink,
    ) -> PowerflowResult<RunOutcome> {
        let Some(case) = self.catalog.lookup(name) else {
            info!("network not in catalog");
            return Ok(RunOutcome::NotFound);
        };

        progress
            .notify(&format!("Initializing network: {name}..."))
            .await;
        let network = blocking(move || case.build()).await?;
        progress
            .notify(&format!("Network {name} initialized successfully."))
            .await;

        progress
            .notify(&format!("Running powerflow on network {name}.."))
            .await;
        let solver = self.solver.clone();
        let (network, results) = blocking(move || {
            let mut network = network;
            let results = solver.solve_in_place(&mut network)?;
            Ok((network, results))
        })
        .await?;
        info!(
            iterations = results.iterations,
            max_mismatch = results.max_mismatch,
            "power flow converged"
        );
        progress
            .notify(&format!(
                "Powerflow on network {name} completed successfully."
            ))
            .await;

        let path = self.workspace.case_path(name);
        let target = path.clone();
        blocking(move || save_network(&target, &network)).await?;
        progress
            .notify(&format!("Network {name} saved to {}", path.display()))
            .await;

        Ok(RunOutcome::Solved { path, results })
    }

    /// Plot bus voltage against hop distance from the slack bus for a network
    /// previously solved by [`PowerflowService::run`].
    #[instrument(skip(self))]
    pub async fn analyze(&self, name: &str) -> PowerflowResult<Analysis> {
        if !self.catalog.contains(name) {
            return Err(PowerflowError::Network(format!(
                "Network '{name}' is not in the catalog"
            )));
        }
        let path = self.workspace.case_path(name);
        let name = name.to_string();
        let (width, height) = (self.plot.width, self.plot.height);

        let analysis = blocking(move || {
            let network = load_solved_network(&path, &name)?;
            let profile = voltage_profile(&network)?;
            let (distance, vm_pu) = profile.series();
            let png = voltage_profile_plot(&distance, &vm_pu)?
                .with_size(width, height)
                .render_png()?;
            Ok(Analysis { profile, png })
        })
        .await?;

        debug!(
            points = analysis.profile.len(),
            bytes = analysis.png.len(),
            "rendered voltage profile"
        );
        Ok(analysis)
    }
}

/// Run CPU-bound work off the async executor.
async fn blocking<T, F>(task: F) -> PowerflowResult<T>
where
    F: FnOnce() -> PowerflowResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| PowerflowError::Task(err.to_string()))?
}
