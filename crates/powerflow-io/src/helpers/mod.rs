pub mod conversions;
pub mod network_builder;

pub use conversions::{safe_f64_to_i32, safe_f64_to_usize};
pub use network_builder::NetworkBuilder;
