//! Error type shared by the powerflow crates.
//!
//! Every failure of the solve/analyze workflow maps onto one [`PowerflowError`]
//! variant, so the tool layer can turn it into a user-facing message instead of
//! tearing down the call.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PowerflowError {
    /// I/O errors (scratch directory, case files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Case file or persisted network could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Network structure problems detected before solving
    #[error("Network error: {0}")]
    Network(String),

    /// Newton-Raphson failed (iteration limit, singular Jacobian, divergence)
    #[error("Solver error: {0}")]
    Solver(String),

    /// No power-flow result is available for the requested case
    #[error("Network '{name}' has no power flow result at {}; run the power flow first", path.display())]
    NotSolved { name: String, path: PathBuf },

    /// The network has no external grid to act as reference bus
    #[error("Network has no external grid; cannot determine the slack bus")]
    NoSlack,

    /// A bus cannot be reached from the slack bus through in-service branches
    #[error("Bus {bus} is not connected to slack bus {slack}")]
    UnreachableBus { bus: usize, slack: usize },

    /// Image rendering or encoding failed
    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A blocking worker panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

pub type PowerflowResult<T> = Result<T, PowerflowError>;

impl From<serde_json::Error> for PowerflowError {
    fn from(err: serde_json::Error) -> Self {
        PowerflowError::Parse(err.to_string())
    }
}
