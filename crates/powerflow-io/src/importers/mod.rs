//! Case file importers.
//!
//! Only MATPOWER `.m` files are supported: the format of every case in the catalog.

pub mod matpower;
pub mod matpower_parser;

pub use matpower::{build_network, load_matpower_network};
pub use matpower_parser::{parse_matpower_file, parse_matpower_string, MatpowerCase};
