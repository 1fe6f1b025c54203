//! Dense linear solvers used by the Newton-Raphson iteration.

mod backend;
mod registry;

pub use backend::{FaerSolver, GaussSolver, LinearSystemBackend};
pub use registry::LinearSolverKind;
