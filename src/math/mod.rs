//! Mathematical utilities: least squares and fixed-point quantization.

pub mod ols;
pub mod split;

pub use ols::*;
pub use split::*;
