#[macro_use]
pub mod macros;
pub mod log_setup;

pub const EPSILON: f64 = 1e-6;
