use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::{FaerSolver, GaussSolver, LinearSystemBackend};
use crate::PowerflowError;

/// Selectable linear solver for the Newton step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearSolverKind {
    Gauss,
    #[default]
    Faer,
}

impl FromStr for LinearSolverKind {
    type Err = PowerflowError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "gauss" => Ok(LinearSolverKind::Gauss),
            "faer" | "default" => Ok(LinearSolverKind::Faer),
            other => Err(PowerflowError::Config(format!(
                "unknown linear solver '{other}'; supported values: {}",
                Self::available().join(", ")
            ))),
        }
    }
}

impl LinearSolverKind {
    pub fn build_solver(self) -> Arc<dyn LinearSystemBackend> {
        match self {
            LinearSolverKind::Gauss => Arc::new(GaussSolver),
            LinearSolverKind::Faer => Arc::new(FaerSolver),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["gauss", "faer"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinearSolverKind::Gauss => "gauss",
            LinearSolverKind::Faer => "faer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_supports_all_engines() {
        assert_eq!("gauss".parse::<LinearSolverKind>().unwrap(), LinearSolverKind::Gauss);
        assert_eq!("FAER".parse::<LinearSolverKind>().unwrap(), LinearSolverKind::Faer);
        assert!(matches!(
            "unknown".parse::<LinearSolverKind>(),
            Err(PowerflowError::Config(_))
        ));
    }

    #[test]
    fn built_solvers_solve_diagonal_system() {
        let matrix = vec![vec![2.0, 0.0], vec![0.0, 3.0]];
        let rhs = vec![4.0, 6.0];
        for kind in [LinearSolverKind::Gauss, LinearSolverKind::Faer] {
            let x = kind.build_solver().solve(&matrix, &rhs).unwrap();
            assert!((x[0] - 2.0).abs() < 1e-12, "{}", kind.as_str());
            assert!((x[1] - 2.0).abs() < 1e-12, "{}", kind.as_str());
        }
    }
}
