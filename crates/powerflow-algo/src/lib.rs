//! # powerflow-algo: AC power flow and voltage profile analysis
//!
//! - [`AcPowerFlowSolver`]: Newton-Raphson AC power flow with optional generator
//!   reactive-limit enforcement, writing results back onto the [`Network`]
//! - [`voltage_profile`]: solved bus voltages against hop distance from the slack bus
//!
//! ## Example
//!
//! ```
//! use powerflow_algo::{voltage_profile, AcPowerFlowSolver};
//! use powerflow_io::BuiltinCase;
//!
//! let mut network = BuiltinCase::Case9.build()?;
//! let results = AcPowerFlowSolver::new()
//!     .with_tolerance(1e-8)
//!     .solve_in_place(&mut network)?;
//! assert!(results.converged);
//!
//! let profile = voltage_profile(&network)?;
//! let (distance, vm) = profile.series();
//! assert_eq!(distance.len(), vm.len());
//! # Ok::<(), powerflow_core::PowerflowError>(())
//! ```
//!
//! [`Network`]: powerflow_core::Network

pub mod power_flow;
pub mod profile;

pub use power_flow::{AcPowerFlowSolution, AcPowerFlowSolver, BusType, YBus};
pub use profile::{voltage_profile, ProfilePoint, VoltageProfile};
