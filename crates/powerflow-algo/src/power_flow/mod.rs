//! Power Flow Solvers
//!
//! - [`ac_pf`]: full AC power flow using Newton-Raphson with Q-limit enforcement
//! - [`admittance`]: sparse-row bus admittance matrix shared by the solver
//!
//! ## Q-Limit Enforcement
//!
//! When enabled, generators that exceed their Q limits have their buses converted
//! from PV (voltage-controlled) to PQ mode, letting the voltage vary while Q is fixed
//! at the limit.

pub mod ac_pf;
pub mod admittance;

pub use ac_pf::{AcPowerFlowSolution, AcPowerFlowSolver, BusType};
pub use admittance::YBus;
