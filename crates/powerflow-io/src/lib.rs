//! # powerflow-io: case catalog, MATPOWER import and network persistence
//!
//! ```
//! use powerflow_io::Catalog;
//!
//! let catalog = Catalog::builtin();
//! let case = catalog.lookup("case9").expect("builtin case");
//! let network = case.build()?;
//! assert_eq!(network.bus_count(), 9);
//! # Ok::<(), powerflow_core::PowerflowError>(())
//! ```
//!
//! - [`catalog`] - builtin cases plus an optional directory of `.m` files
//! - [`importers`] - MATPOWER parser and conversion to [`powerflow_core::Network`]
//! - [`persist`] - atomic JSON save/load of solved networks

pub mod catalog;
pub mod helpers;
pub mod importers;
pub mod persist;

pub use catalog::{BuiltinCase, Catalog, NetworkCase};
pub use importers::{build_network, load_matpower_network, parse_matpower_file, parse_matpower_string};
pub use persist::{load_network, load_solved_network, save_network};
